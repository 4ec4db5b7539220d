//! Wiring for `teambot run`: Slack transport, SQLite directory, roster
//! plugin and the event loop.

use std::sync::Arc;

use {
    anyhow::{Context, bail},
    teambot_channels::Transport,
    teambot_config::{Severity, TeambotConfig, validate},
    teambot_directory::SqliteDirectory,
    teambot_gateway::{EventLoop, LoopConfig},
    teambot_plugins::PluginHost,
    teambot_roster::RosterProcessor,
    teambot_slack::{SlackAccountConfig, SlackTransport},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

pub async fn run(config: TeambotConfig) -> anyhow::Result<()> {
    let report = validate(&config, None);
    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    if report.has_errors() {
        bail!("invalid configuration; run `teambot config check` for details");
    }

    let transport: Arc<dyn Transport> = Arc::new(SlackTransport::new(slack_account(&config)?)?);
    let directory = SqliteDirectory::open(&config.directory.path)
        .await
        .with_context(|| {
            format!(
                "cannot open team directory {}",
                config.directory.path.display()
            )
        })?;
    let processor = RosterProcessor::new(Box::new(directory))?;
    let host = PluginHost::new(Box::new(processor)).with_diagnostic(config.debug);

    let mut event_loop = EventLoop::new(transport, host, loop_config(&config));
    let identity = event_loop.start().await?;
    info!(bot = %identity.user_id, name = %identity.name, "teambot is online");

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
        }
        shutdown.cancel();
    });

    event_loop.run(cancel).await?;
    Ok(())
}

fn slack_account(config: &TeambotConfig) -> anyhow::Result<SlackAccountConfig> {
    let (Some(bot_token), Some(app_token)) = (&config.slack.bot_token, &config.slack.app_token)
    else {
        bail!("both slack.bot_token and slack.app_token are required");
    };
    Ok(
        SlackAccountConfig::new(bot_token.clone(), app_token.clone())
            .with_api_base_url(config.slack.api_base_url.clone())
            .with_max_reconnect_backoff(config.runtime.max_backoff()),
    )
}

fn loop_config(config: &TeambotConfig) -> LoopConfig {
    let runtime = &config.runtime;
    LoopConfig {
        poll_interval: runtime.poll_interval(),
        pacing: runtime.pacing(),
        heartbeat_interval: runtime.heartbeat_interval(),
        max_consecutive_faults: runtime.max_consecutive_faults,
        max_backoff: runtime.max_backoff(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::time::Duration};

    fn config(toml_src: &str) -> TeambotConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teambot.toml");
        std::fs::write(&path, toml_src).unwrap();
        teambot_config::load_config(&path).unwrap()
    }

    #[test]
    fn runtime_settings_reach_the_loop() {
        let cfg = config(
            "[runtime]\npoll_interval_ms = 250\npacing_ms = 50\nheartbeat_secs = 10\n\
             max_consecutive_faults = 2\nmax_backoff_ms = 4000\n",
        );
        let lc = loop_config(&cfg);
        assert_eq!(lc.poll_interval, Duration::from_millis(250));
        assert_eq!(lc.pacing, Duration::from_millis(50));
        assert_eq!(lc.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(lc.max_consecutive_faults, 2);
        assert_eq!(lc.max_backoff, Duration::from_secs(4));
    }

    #[test]
    fn slack_account_copies_tokens_and_endpoint() {
        let cfg = config(
            "[slack]\nbot_token = \"xoxb-1\"\napp_token = \"xapp-1\"\n\
             api_base_url = \"http://127.0.0.1:9/api\"\n",
        );
        let account = slack_account(&cfg).unwrap();
        assert_eq!(account.bot_token.expose_secret(), "xoxb-1");
        assert_eq!(account.app_token.expose_secret(), "xapp-1");
        assert_eq!(account.api_base_url, "http://127.0.0.1:9/api");
    }

    #[test]
    fn slack_account_requires_both_tokens() {
        let cfg = config("[slack]\nbot_token = \"xoxb-1\"\n");
        assert!(slack_account(&cfg).is_err());
    }

    #[tokio::test]
    async fn run_refuses_invalid_config() {
        let err = run(TeambotConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
