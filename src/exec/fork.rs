// src/exec/fork.rs

//! Isolated execution rooted at a directory.
//!
//! - [`fork_in`] forks the calling process and runs a closure in the child
//!   after changing to the target directory (unix only).
//! - [`spawn_in`] runs an external command with the directory passed to the
//!   spawn call; the parent's working directory is never touched.

use std::path::Path;

use crate::errors::RunError;
use crate::exec::{CommandSpec, RunOptions};

/// Exit status of a forked child whose work failed, panicked, or could not
/// change into the target directory.
pub const FORK_WORK_FAILED: i32 = 255;

/// Fork, run `work` in the child rooted at `dir`, and return the child's
/// exit status once it has been reaped.
///
/// The child exits with `0` when `work` returns `Ok`, and with
/// [`FORK_WORK_FAILED`] otherwise. It leaves via `_exit`, so it never
/// returns into the caller and never runs the parent's exit handlers.
///
/// Blocks the calling thread until the child exits.
///
/// # Safety
///
/// In a multi-threaded process only the forking thread survives in the
/// child. `work` must not depend on locks or state owned by other threads
/// (for example a lock held by another thread at the time of the fork).
#[cfg(unix)]
pub unsafe fn fork_in<P, F, E>(dir: P, work: F) -> Result<i32, RunError>
where
    P: AsRef<Path>,
    F: FnOnce() -> Result<(), E>,
{
    use nix::unistd::{ForkResult, fork};
    use tracing::debug;

    let dir = dir.as_ref();
    let label = format!("fork_in {}", dir.display());

    // SAFETY: upheld by the caller, see above.
    let forked = unsafe { fork() }.map_err(|errno| RunError::Spawn {
        command: label.clone(),
        source: errno.into(),
    })?;

    match forked {
        ForkResult::Parent { child } => {
            debug!(pid = child.as_raw(), dir = %dir.display(), "forked work process");
            reap_forked(child, &label)
        }
        ForkResult::Child => {
            let code = run_forked_work(dir, work);
            // SAFETY: `_exit` only terminates the process.
            unsafe { nix::libc::_exit(code) }
        }
    }
}

#[cfg(unix)]
fn run_forked_work<F, E>(dir: &Path, work: F) -> i32
where
    F: FnOnce() -> Result<(), E>,
{
    if std::env::set_current_dir(dir).is_err() {
        return FORK_WORK_FAILED;
    }
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(work)) {
        Ok(Ok(())) => 0,
        Ok(Err(_)) | Err(_) => FORK_WORK_FAILED,
    }
}

#[cfg(unix)]
fn reap_forked(child: nix::unistd::Pid, label: &str) -> Result<i32, RunError> {
    use nix::errno::Errno;
    use nix::sys::wait::{WaitStatus, waitpid};

    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(RunError::Wait {
                    command: label.to_string(),
                    source: errno.into(),
                });
            }
        }
    }
}

/// Run `command` with `dir` as its working directory and return its exit
/// status. Other options (timeout, stdin, redirects, env) apply as usual.
pub async fn spawn_in(
    dir: impl AsRef<Path>,
    command: &CommandSpec,
    options: &RunOptions,
) -> Result<i32, RunError> {
    let options = options.clone().current_dir(dir.as_ref());
    crate::exec::run(command, &options).await
}
