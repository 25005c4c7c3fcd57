// src/exec/cwd.rs

//! Serialized access to the process-wide current directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with the process working directory set to `dir`.
///
/// A single global lock is held for the directory change plus `f`, and the
/// previous directory is restored on every exit path, including a panic in
/// `f`. Code that only needs a child process in another directory should
/// use [`crate::exec::spawn_in`] instead.
pub fn with_current_dir<P, F, T>(dir: P, f: F) -> io::Result<T>
where
    P: AsRef<Path>,
    F: FnOnce() -> T,
{
    let _lock = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let previous = std::env::current_dir()?;
    std::env::set_current_dir(dir.as_ref())?;
    debug!(dir = %dir.as_ref().display(), "changed working directory");
    let _restore = RestoreDir { previous };

    Ok(f())
}

struct RestoreDir {
    previous: PathBuf,
}

impl Drop for RestoreDir {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            warn!(
                dir = %self.previous.display(),
                error = %e,
                "failed to restore working directory"
            );
        }
    }
}
