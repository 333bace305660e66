use anyhow::{anyhow, Context, Result};
use bot_ci::cli::commands::{RunCommand, ValidateCommand};
use bot_ci::cli::output::*;
use bot_ci::cli::{is_invalid_setting, Cli, Command, LogFormat};
use bot_ci::core::config::{ConfigError, DeployConfig};
use bot_ci::execution::{DeployEngine, ExecutionEvent};
use bot_ci::runner::{RunnerConfig, ShellRunner};
use bot_ci::{notify, Pipeline};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Exit status for invalid configuration (sysexits `EX_DATAERR`)
const EX_DATAERR: i32 = 65;

#[tokio::main]
async fn main() -> Result<()> {
    // Values from .env become environment variables before clap reads them
    let dotenv = dotenvy::dotenv();

    let cli = match Cli::try_from_args() {
        Ok(cli) => cli,
        Err(e) if is_invalid_setting(&e) => {
            let _ = e.print();
            std::process::exit(EX_DATAERR);
        }
        Err(e) => e.exit(),
    };
    init_logging(&cli)?;

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring .env file: {}", e);
        }
    }

    match cli.command() {
        Command::Run(cmd) => deploy(&cli, &cmd).await?,
        Command::Validate(cmd) => validate(&cli, &cmd)?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cli.log_level()))
        .with_context(|| format!("Invalid log level: {}", cli.log_level()))?;

    let (writer, ansi) = match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);

    match cli.log_format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .map_err(|e| anyhow!("Failed to set logging subscriber: {}", e))
}

fn load_config(cli: &Cli) -> Result<DeployConfig, ConfigError> {
    DeployConfig::load(cli.settings.clone(), cli.config.as_deref())
}

async fn deploy(cli: &Cli, cmd: &RunCommand) -> Result<()> {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            println!("{} Invalid configuration: {}", CROSS, style(e).red());
            std::process::exit(EX_DATAERR);
        }
    };

    let notifier = notify::from_settings(&config.telegram)
        .context("Failed to set up Telegram notifications")?;
    let runner = Arc::new(ShellRunner::new(
        RunnerConfig::new().with_timeout(config.command_timeout_secs),
    ));

    let mut pipeline = Pipeline::from_config(&config);
    let engine = DeployEngine::new(runner, config, notifier);

    let spinner = create_spinner();
    if !cmd.quiet {
        let progress = spinner.clone();
        engine.add_event_handler(move |event| {
            if let ExecutionEvent::StageStarted { stage } = &event {
                progress.set_message(stage.description());
                return;
            }
            let line = format_execution_event(&event);
            if progress.is_hidden() {
                println!("{}", line);
            } else {
                progress.println(line);
            }
        });
    }

    let result = engine.execute(&mut pipeline).await;
    spinner.finish_and_clear();

    match result {
        Ok(status) => {
            if !cmd.quiet {
                println!(
                    "\n{} {} {}",
                    CHECK,
                    style(&pipeline.name).bold(),
                    format_status(status)
                );
            }
            Ok(())
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&pipeline.name).bold(),
                style("failed").red()
            );
            for stage in &pipeline.stages {
                println!("  {:<22} {}", stage.name(), format_stage_state(&stage.state));
            }
            if let Some(stage) = pipeline.failed_stage() {
                println!("\n{} {}", CROSS, style(stage.description()).red());
            }
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate(cli: &Cli, cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    match load_config(cli) {
        Ok(config) => {
            println!("{} Configuration is valid!", CHECK);
            println!("{}", format_config(&config));

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(EX_DATAERR);
        }
    }
}
