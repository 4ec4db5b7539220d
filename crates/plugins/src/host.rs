use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use {
    teambot_channels::{BotIdentity, Event, OutputMessage, Transport},
    tracing::{debug, info, warn},
};

use crate::{Error, Result, plugin::Plugin};

// ── PluginStats ─────────────────────────────────────────────────────────────

/// Health counters for the hosted plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginStats {
    pub call_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u64,
    pub total_latency: Duration,
}

impl PluginStats {
    pub fn record_success(&mut self, latency: Duration) {
        self.call_count += 1;
        self.consecutive_failures = 0;
        self.total_latency += latency;
    }

    pub fn record_failure(&mut self, latency: Duration) {
        self.call_count += 1;
        self.failure_count += 1;
        self.consecutive_failures += 1;
        self.total_latency += latency;
    }

    pub fn avg_latency(&self) -> Duration {
        if self.call_count == 0 {
            return Duration::ZERO;
        }
        let micros = self.total_latency.as_micros() / u128::from(self.call_count);
        Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
    }
}

// ── PluginHost ──────────────────────────────────────────────────────────────

/// Runs one plugin and collects its replies in a FIFO queue.
pub struct PluginHost {
    plugin: Box<dyn Plugin>,
    identity: Option<BotIdentity>,
    outbox: VecDeque<OutputMessage>,
    stats: PluginStats,
    /// When true, handler errors are returned to the caller instead of logged.
    diagnostic: bool,
}

impl PluginHost {
    pub fn new(plugin: Box<dyn Plugin>) -> Self {
        Self {
            plugin,
            identity: None,
            outbox: VecDeque::new(),
            stats: PluginStats::default(),
            diagnostic: false,
        }
    }

    /// Enable diagnostic mode.
    pub fn with_diagnostic(mut self, diagnostic: bool) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin.name()
    }

    pub fn identity(&self) -> Option<&BotIdentity> {
        self.identity.as_ref()
    }

    pub fn stats(&self) -> &PluginStats {
        &self.stats
    }

    /// Number of replies waiting to be sent.
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Hand the identity and transport to the plugin. Failure here is always
    /// fatal.
    pub async fn setup(
        &mut self,
        identity: BotIdentity,
        transport: Arc<dyn Transport>,
    ) -> Result<()> {
        self.plugin
            .setup(&identity, transport)
            .await
            .map_err(|e| Error::setup(self.plugin.name(), &e))?;
        info!(
            plugin = self.plugin.name(),
            bot = %identity.user_id,
            "plugin set up"
        );
        self.identity = Some(identity);
        Ok(())
    }

    /// Route one event to the plugin.
    ///
    /// Chat messages reach `handle` unless they carry a subtype or were sent
    /// by the bot itself; every event reaches `catch_all`. A failing call
    /// queues nothing.
    pub async fn dispatch(&mut self, event: &Event) -> Result<()> {
        let Some(identity) = self.identity.as_ref() else {
            return Err(Error::NotSetUp {
                plugin: self.plugin.name().to_string(),
            });
        };

        if let Event::Message(message) = event {
            if let Some(subtype) = &message.subtype {
                debug!(channel = %message.channel, subtype, "skipping message with subtype");
            } else if identity.is_self(&message.sender) {
                debug!(channel = %message.channel, "skipping self-authored message");
            } else {
                let started = Instant::now();
                let result = self.plugin.handle(message).await;
                self.settle("handle", event, started, result)?;
            }
        }

        let started = Instant::now();
        let result = self.plugin.catch_all(event).await;
        self.settle("catch_all", event, started, result)
    }

    fn settle(
        &mut self,
        stage: &'static str,
        event: &Event,
        started: Instant,
        result: anyhow::Result<Vec<OutputMessage>>,
    ) -> Result<()> {
        let latency = started.elapsed();
        match result {
            Ok(outputs) => {
                self.stats.record_success(latency);
                self.outbox.extend(outputs);
                Ok(())
            },
            Err(e) => {
                self.stats.record_failure(latency);
                warn!(
                    plugin = self.plugin.name(),
                    stage,
                    event = event.kind(),
                    channel = event.channel().map(|c| c.as_str()),
                    consecutive_failures = self.stats.consecutive_failures,
                    error = %format!("{e:#}"),
                    "plugin handler failed"
                );
                if self.diagnostic {
                    return Err(Error::handler_fault(self.plugin.name(), stage, &e));
                }
                Ok(())
            },
        }
    }

    /// Next reply in enqueue order.
    pub fn pop_output(&mut self) -> Option<OutputMessage> {
        self.outbox.pop_front()
    }

    /// Take every queued reply, oldest first.
    pub fn drain_outputs(&mut self) -> Vec<OutputMessage> {
        self.outbox.drain(..).collect()
    }
}
