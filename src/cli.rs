// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `outproc`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "outproc",
    version,
    about = "Run a command and relay its output line by line.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Outproc.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Named `[profile.<name>]` from the config file.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OUTPROC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Kill the command if it runs longer than this (e.g. `500ms`, `10s`).
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Standard input: `closed`, `inherit`, or a file path.
    #[arg(long, value_name = "POLICY")]
    pub stdin: Option<String>,

    /// Fail on invalid UTF-8 instead of replacing it.
    #[arg(long)]
    pub strict: bool,

    /// Join the arguments and run them through the platform shell.
    #[arg(long)]
    pub shell: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Mode {
    /// Print stdout lines as `Out: ...` and stderr lines as `Err: ...`,
    /// then exit with the command's status.
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },

    /// Print whitespace-split output rows tab-separated; a failing command
    /// is reported with its error text.
    Data {
        /// Do not capture stdout.
        #[arg(long)]
        ignore_output: bool,

        /// Do not capture stderr; report failure only through the exit code.
        #[arg(long)]
        ignore_errors: bool,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        argv: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
