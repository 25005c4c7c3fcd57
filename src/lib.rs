// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::{CliArgs, Mode};
use crate::config::{load_for_cli, parse_timeout};

pub use crate::errors::{CmdFailed, ConsumerError, DataCmdError, RunError};
pub use crate::exec::{
    CommandSpec, DataCmd, DataOutcome, OutProc, Redirect, RunOptions, SpawnOptions, StdinPolicy,
    StreamKind, TextEncoding,
};

/// High-level entry point used by `main.rs`.
///
/// Resolves options (config file, profile, then CLI flags), runs the
/// command in the selected mode and returns the exit code the binary
/// should use.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_for_cli(args.config.as_deref().map(Path::new))?;
    let profile = cfg.profile(args.profile.as_deref())?;

    let mut options = profile.to_run_options();
    apply_cli_overrides(&args, &mut options)?;
    let shell = args.shell || profile.uses_shell();

    debug!(?options, shell, "resolved run options");

    match args.mode {
        Mode::Run { argv } => run_tagged(command_from(argv, shell), options).await,
        Mode::Data {
            ignore_output,
            ignore_errors,
            argv,
        } => {
            let cmd = DataCmd::new(command_from(argv, shell))
                .ignore_output(ignore_output)
                .ignore_errors(ignore_errors)
                .options(options);
            run_data(cmd).await
        }
    }
}

fn apply_cli_overrides(args: &CliArgs, options: &mut RunOptions) -> Result<()> {
    if let Some(ref timeout) = args.timeout {
        let timeout = parse_timeout(timeout)
            .map_err(anyhow::Error::msg)
            .context("invalid --timeout")?;
        options.timeout = Some(timeout);
    }
    if let Some(ref stdin) = args.stdin {
        options.stdin = stdin
            .parse()
            .map_err(anyhow::Error::msg)
            .context("invalid --stdin")?;
    }
    if args.strict {
        options.encoding = TextEncoding::Utf8;
    }
    Ok(())
}

fn command_from(argv: Vec<String>, shell: bool) -> CommandSpec {
    if shell {
        CommandSpec::Shell(argv.join(" "))
    } else {
        CommandSpec::Argv(argv)
    }
}

/// `run` mode: tag each line with its stream.
async fn run_tagged(command: CommandSpec, options: RunOptions) -> Result<i32> {
    let display = command.to_string();
    let status = OutProc::new(command)
        .options(options)
        .read_out(|line| {
            println!("Out: {line}");
            Ok(())
        })
        .read_err(|line| {
            println!("Err: {line}");
            Ok(())
        })
        .run()
        .await
        .with_context(|| format!("running `{display}`"))?;
    Ok(status)
}

/// `data` mode: print token rows; a failed command prints its error and
/// propagates the exit code.
async fn run_data(cmd: DataCmd) -> Result<i32> {
    match cmd.run().await {
        Ok(DataOutcome::Rows(rows)) => {
            for row in rows {
                println!("{}", row.join("\t"));
            }
            Ok(0)
        }
        Ok(DataOutcome::Done) => Ok(0),
        Ok(DataOutcome::Failed(code)) => Ok(code),
        Err(DataCmdError::Failed(failed)) => {
            eprintln!("{failed}");
            Ok(failed.exit_code)
        }
        Err(DataCmdError::Run(e)) => Err(e.into()),
    }
}
