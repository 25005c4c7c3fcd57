// tests/run_consumers.rs
#![cfg(unix)]

use std::error::Error;
use std::fs;

use outproc::exec::{Redirect, RunOptions, StdinPolicy, TextEncoding};
use outproc::{CommandSpec, OutProc, RunError, StreamKind};
use outproc_test_utils::{LineRecorder, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> CommandSpec {
    CommandSpec::argv(["sh", "-c", script])
}

#[tokio::test]
async fn echo_true_delivers_single_line() -> TestResult {
    init_tracing();

    let mut lines = Vec::new();
    let status = OutProc::new(CommandSpec::argv(["echo", "true"]))
        .read_out(|line| {
            lines.push(line.to_owned());
            Ok(())
        })
        .run()
        .await?;

    assert_eq!(status, 0);
    assert_eq!(lines, vec!["true".to_string()]);
    Ok(())
}

#[tokio::test]
async fn ls_partial_failure_splits_streams() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let status = OutProc::new(CommandSpec::argv(["ls", "-d", "/etc", "/nonexistent"]))
        .read_out(rec.out())
        .read_err(rec.err())
        .run()
        .await?;

    assert_ne!(status, 0, "ls should report the missing path");
    assert_eq!(rec.lines(StreamKind::Stdout), vec!["/etc".to_string()]);

    let errors = rec.lines(StreamKind::Stderr);
    assert_eq!(errors.len(), 1, "unexpected stderr: {errors:?}");
    assert!(
        errors[0].contains("No such file or directory"),
        "unexpected stderr line: {}",
        errors[0]
    );
    Ok(())
}

#[tokio::test]
async fn stdout_lines_are_delivered_before_stderr_lines() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let status = OutProc::new(sh(
        "echo e1 >&2; echo o1; echo e2 >&2; echo o2; echo e3 >&2",
    ))
    .read_out(rec.out())
    .read_err(rec.err())
    .run()
    .await?;

    assert_eq!(status, 0);
    let expected = vec![
        (StreamKind::Stdout, "o1".to_string()),
        (StreamKind::Stdout, "o2".to_string()),
        (StreamKind::Stderr, "e1".to_string()),
        (StreamKind::Stderr, "e2".to_string()),
        (StreamKind::Stderr, "e3".to_string()),
    ];
    assert_eq!(rec.events(), expected);
    Ok(())
}

#[tokio::test]
async fn exit_status_is_returned_verbatim() -> TestResult {
    init_tracing();

    for code in [0, 1, 2, 42, 127, 255] {
        let status = outproc::exec::run(&sh(&format!("exit {code}")), &RunOptions::default())
            .await?;
        assert_eq!(status, code);
    }
    Ok(())
}

#[tokio::test]
async fn signalled_child_reports_128_plus_signal() -> TestResult {
    init_tracing();

    let status = outproc::exec::run(&sh("kill -9 $$"), &RunOptions::default()).await?;
    assert_eq!(status, 128 + 9);
    Ok(())
}

#[tokio::test]
async fn terminators_are_stripped_and_blank_lines_kept() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    OutProc::new(CommandSpec::argv(["printf", "a\\r\\n\\nb\\nlast"]))
        .read_out(rec.out())
        .run()
        .await?;

    assert_eq!(
        rec.lines(StreamKind::Stdout),
        vec!["a".to_string(), String::new(), "b".to_string(), "last".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn consumer_error_stops_delivery_and_propagates() -> TestResult {
    init_tracing();

    let mut seen = Vec::new();
    let result = OutProc::new(sh("echo one; echo two; echo three"))
        .read_out(|line| {
            seen.push(line.to_owned());
            if line == "two" {
                return Err("rejected line".into());
            }
            Ok(())
        })
        .run()
        .await;

    match result {
        Err(RunError::Consumer {
            stream,
            line,
            source,
        }) => {
            assert_eq!(stream, StreamKind::Stdout);
            assert_eq!(line, 2);
            assert_eq!(source.to_string(), "rejected line");
        }
        other => panic!("expected consumer error, got {other:?}"),
    }
    assert_eq!(seen, vec!["one".to_string(), "two".to_string()]);
    Ok(())
}

#[tokio::test]
async fn stderr_consumer_error_still_delivers_stdout_first() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let result = OutProc::new(sh("echo out; echo err >&2"))
        .read_out(rec.out())
        .read_err(|_line| Err("stderr not allowed".into()))
        .run()
        .await;

    assert!(matches!(
        result,
        Err(RunError::Consumer {
            stream: StreamKind::Stderr,
            line: 1,
            ..
        })
    ));
    assert_eq!(rec.lines(StreamKind::Stdout), vec!["out".to_string()]);
    Ok(())
}

#[tokio::test]
async fn large_output_does_not_stall_the_child() -> TestResult {
    init_tracing();

    let mut count = 0usize;
    let mut last = String::new();
    let status = with_timeout(
        OutProc::new(sh("i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done"))
            .read_out(|line| {
                count += 1;
                last = line.to_owned();
                Ok(())
            })
            .run(),
    )
    .await?;

    assert_eq!(status, 0);
    assert_eq!(count, 20000);
    assert_eq!(last, "line-19999");
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_is_replaced_by_default_and_fails_when_strict() -> TestResult {
    init_tracing();

    let script = "printf 'ok\\n\\377bad\\n'";

    let rec = LineRecorder::new();
    let status = OutProc::new(sh(script))
        .read_out(rec.out())
        .run()
        .await?;
    assert_eq!(status, 0);
    assert_eq!(
        rec.lines(StreamKind::Stdout),
        vec!["ok".to_string(), "\u{FFFD}bad".to_string()]
    );

    let strict = OutProc::new(sh(script))
        .options(RunOptions::new().encoding(TextEncoding::Utf8))
        .read_out(|_| Ok(()))
        .run()
        .await;
    assert!(matches!(
        strict,
        Err(RunError::Decode {
            stream: StreamKind::Stdout,
            line: 2
        })
    ));
    Ok(())
}

#[tokio::test]
async fn non_utf8_output_still_returns_the_exit_status() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let status = OutProc::new(sh("printf 'caf\\351\\n'; exit 3"))
        .read_out(rec.out())
        .run()
        .await?;

    assert_eq!(status, 3);
    assert_eq!(rec.lines(StreamKind::Stdout), vec!["caf\u{FFFD}".to_string()]);
    Ok(())
}

#[tokio::test]
async fn stdin_is_closed_by_default() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let status = with_timeout(OutProc::new(CommandSpec::argv(["cat"])).read_out(rec.out()).run())
        .await?;

    assert_eq!(status, 0);
    assert!(rec.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn stdin_can_come_from_a_file() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.txt");
    fs::write(&input, "x\ny\n")?;

    let rec = LineRecorder::new();
    OutProc::new(CommandSpec::argv(["cat"]))
        .options(RunOptions::new().stdin(StdinPolicy::File(input)))
        .read_out(rec.out())
        .run()
        .await?;

    assert_eq!(
        rec.lines(StreamKind::Stdout),
        vec!["x".to_string(), "y".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn explicit_destinations_are_used_verbatim() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let out_file = dir.path().join("out.txt");
    let err_file = dir.path().join("err.txt");
    fs::write(&err_file, "earlier\n")?;

    let status = outproc::exec::run(
        &sh("echo to-out; echo to-err >&2"),
        &RunOptions::new()
            .stdout(Redirect::File(out_file.clone()))
            .stderr(Redirect::Append(err_file.clone())),
    )
    .await?;

    assert_eq!(status, 0);
    assert_eq!(fs::read_to_string(&out_file)?, "to-out\n");
    assert_eq!(fs::read_to_string(&err_file)?, "earlier\nto-err\n");
    Ok(())
}

#[tokio::test]
async fn redirect_on_one_stream_and_consumer_on_the_other() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let out_file = dir.path().join("out.txt");

    let rec = LineRecorder::new();
    OutProc::new(sh("echo to-out; echo to-err >&2"))
        .options(RunOptions::new().stdout(Redirect::File(out_file.clone())))
        .read_err(rec.err())
        .run()
        .await?;

    assert_eq!(fs::read_to_string(&out_file)?, "to-out\n");
    assert_eq!(rec.events(), vec![(StreamKind::Stderr, "to-err".to_string())]);
    Ok(())
}

#[tokio::test]
async fn spawn_options_set_directory_and_environment() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let canonical = dir.path().canonicalize()?;

    let rec = LineRecorder::new();
    OutProc::new(sh("pwd -P; echo \"$OUTPROC_TEST_VALUE\""))
        .options(
            RunOptions::new()
                .current_dir(dir.path())
                .env("OUTPROC_TEST_VALUE", "from-options"),
        )
        .read_out(rec.out())
        .run()
        .await?;

    assert_eq!(
        rec.lines(StreamKind::Stdout),
        vec![
            canonical.display().to_string(),
            "from-options".to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn shell_command_lines_run_through_sh() -> TestResult {
    init_tracing();

    let rec = LineRecorder::new();
    let status = OutProc::new(CommandSpec::shell("echo abc | tr a-c x-z"))
        .read_out(rec.out())
        .run()
        .await?;

    assert_eq!(status, 0);
    assert_eq!(rec.lines(StreamKind::Stdout), vec!["xyz".to_string()]);
    Ok(())
}

#[tokio::test]
async fn repeated_runs_are_independent() -> TestResult {
    init_tracing();

    let command = sh("echo a; echo b >&2; exit 3");
    let mut results = Vec::new();
    for _ in 0..2 {
        let rec = LineRecorder::new();
        let status = OutProc::new(command.clone())
            .read_out(rec.out())
            .read_err(rec.err())
            .run()
            .await?;
        results.push((status, rec.events()));
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].0, 3);
    Ok(())
}
