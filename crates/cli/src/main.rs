mod bot;
mod config_commands;
mod teams_commands;

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    teambot_config::LoadedConfig,
    tracing::{Subscriber, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{config_commands::ConfigAction, teams_commands::TeamsAction};

#[derive(Parser)]
#[command(name = "teambot", about = "Teambot: Slack team rosters", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./teambot.{toml,yaml,yml,json}, then ~/.config/teambot/).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Also append logs to this file (overrides config `log_file` and LOGFILE).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and serve roster commands (the default).
    Run,
    /// Inspect the team directory.
    Teams {
        #[command(subcommand)]
        action: TeamsAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Stdout layer (plain or JSON) plus an optional plain-text file layer.
fn subscriber(cli: &Cli, log_file: Option<File>) -> Box<dyn Subscriber + Send + Sync> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
    });

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer);

    if cli.json_logs {
        Box::new(registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)))
    } else {
        Box::new(
            registry.with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            ),
        )
    }
}

fn init_telemetry(cli: &Cli, log_file: Option<File>) {
    subscriber(cli, log_file).init();
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = teambot_config::load(cli.config.as_deref())?;
    let log_file = match cli.log_file.as_ref().or(loaded.config.log_file.as_ref()) {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };
    init_telemetry(&cli, log_file);

    info!(version = env!("CARGO_PKG_VERSION"), "teambot starting");
    log_config_source(&loaded);

    match cli.command {
        None | Some(Commands::Run) => bot::run(loaded.config).await,
        Some(Commands::Teams { action }) => {
            teams_commands::handle_teams(action, &loaded.config).await
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, &loaded),
    }
}

fn log_config_source(loaded: &LoadedConfig) {
    match &loaded.path {
        Some(path) => info!(
            path = %path.display(),
            env_overrides = ?loaded.env_overrides,
            "configuration loaded"
        ),
        None => info!(
            env_overrides = ?loaded.env_overrides,
            "no config file, using defaults and environment"
        ),
    }
}
