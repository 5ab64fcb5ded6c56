//! AutoRPA - Browser RPA workflow engine
//!
//! Main entry point for the AutoRPA CLI.

mod cli;
mod commands;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use autorpa_config::{Config, ConfigLoader, LoggingConfig};

use cli::{Cli, Commands};

/// Initialize tracing with console output and, when configured, a daily
/// rotated log file.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let (file, guard) = match &logging.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("autorpa")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match ConfigLoader::default_path() {
            Some(path) => ConfigLoader::load_or_default(&path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        },
    };
    Ok(config)
}

async fn dispatch(cli: Cli, mut config: Config) -> Result<bool> {
    match cli.command {
        Commands::Run {
            workflow,
            backend,
            vars,
            headless,
            keep_going,
            json,
        } => {
            if let Some(backend) = backend {
                config.executor.backend = backend;
            }
            if headless {
                config.browser.headless = true;
            }
            if keep_going {
                config.executor.stop_on_failure = false;
            }
            for warning in ConfigLoader::validate(&config)? {
                warn!("{}", warning);
            }
            commands::run(&config, &workflow, &vars, json).await
        }
        Commands::Validate { workflow } => commands::validate(&config, &workflow),
        Commands::Types { category, format } => {
            commands::types(&config, category.as_deref(), &format)?;
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let _guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    match dispatch(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
