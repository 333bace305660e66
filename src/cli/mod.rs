//! Command-line interface

pub mod commands;
pub mod output;

use crate::core::config::ConfigSource;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{RunCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Continuous deployment for Telegram bots
///
/// Every option can also be set through the environment (or a `.env` file)
/// and in the YAML file given with `--config`. Flags win over the
/// environment, which wins over the file.
#[derive(Debug, Parser, Clone)]
#[command(name = "bot-ci")]
#[command(version)]
#[command(about = "Pull, test and restart a Telegram bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true, env = "BOT_CI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, env = "LOGGING_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log line layout: full, compact or pretty
    ///
    /// LOGGING_FORMAT names one of these layouts; it is not a format string.
    #[arg(long, global = true, env = "LOGGING_FORMAT", value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, env = "LOGGING_FILENAME")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub settings: ConfigSource,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deploy the bot (the default)
    Run(RunCommand),

    /// Resolve and print the configuration without deploying
    Validate(ValidateCommand),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

impl Cli {
    /// Parse CLI arguments from the process arguments and environment
    pub fn try_from_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// The subcommand, `run` when none was given
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run(RunCommand::default()))
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Whether a parse error comes from a malformed setting value (a flag or
/// its environment variable) rather than from wrong usage
pub fn is_invalid_setting(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::ValueValidation | ErrorKind::InvalidValue)
}
