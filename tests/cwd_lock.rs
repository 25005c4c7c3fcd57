// tests/cwd_lock.rs
//
// Changes the process working directory; every test here goes through
// `with_current_dir`, which serializes them.

use std::error::Error;
use std::panic;
use std::sync::Arc;
use std::thread;

use outproc::exec::with_current_dir;
use outproc_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn directory_is_changed_for_the_closure_and_restored() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let canonical = dir.path().canonicalize()?;

    let inside = with_current_dir(dir.path(), || {
        std::env::current_dir().and_then(|p| p.canonicalize())
    })??;
    assert_eq!(inside, canonical);

    // Read under the lock so other tests in this binary are not mid-change.
    let after = with_current_dir(".", std::env::current_dir)??;
    assert_ne!(after, canonical);
    Ok(())
}

#[test]
fn directory_is_restored_after_a_panic() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let canonical = dir.path().canonicalize()?;
    let path = dir.path().to_path_buf();

    let outcome = panic::catch_unwind(move || {
        with_current_dir(&path, || -> u8 { panic!("boom inside with_current_dir") })
    });
    assert!(outcome.is_err());

    // The lock is usable again and the directory was put back.
    let now = with_current_dir(".", std::env::current_dir)??;
    assert_ne!(now, canonical);
    Ok(())
}

#[test]
fn missing_directory_is_an_error_and_closure_does_not_run() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("absent");

    let mut ran = false;
    let result = with_current_dir(&missing, || ran = true);

    assert!(result.is_err());
    assert!(!ran);
    Ok(())
}

#[test]
fn concurrent_callers_each_see_their_own_directory() -> TestResult {
    init_tracing();

    let dirs: Vec<_> = (0..4)
        .map(|_| tempfile::tempdir())
        .collect::<Result<_, _>>()?;
    let dirs = Arc::new(dirs);

    let handles: Vec<_> = (0..dirs.len())
        .map(|i| {
            let dirs = Arc::clone(&dirs);
            thread::spawn(move || {
                let target = dirs[i].path().canonicalize().unwrap();
                for _ in 0..20 {
                    let seen = with_current_dir(dirs[i].path(), || {
                        thread::yield_now();
                        std::env::current_dir().unwrap().canonicalize().unwrap()
                    })
                    .unwrap();
                    assert_eq!(seen, target);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
    Ok(())
}
