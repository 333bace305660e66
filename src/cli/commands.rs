//! CLI command definitions

use clap::Args;

/// Deploy the bot
#[derive(Debug, Args, Clone, Default)]
pub struct RunCommand {
    /// Only log; do not print progress to the terminal
    #[arg(short, long)]
    pub quiet: bool,
}

/// Resolve and print the configuration
#[derive(Debug, Args, Clone, Default)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
