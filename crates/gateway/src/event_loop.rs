use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use {
    teambot_channels::{BotIdentity, Transport},
    teambot_plugins::PluginHost,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    faults::{TransportFaults, TransportOp},
};

/// Timing and fault tolerance of the loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Sleep between ticks when no fault is pending.
    pub poll_interval: Duration,
    /// Delay between two consecutive sends within one drain.
    pub pacing: Duration,
    pub heartbeat_interval: Duration,
    /// Consecutive transport faults tolerated before the loop stops.
    /// Zero makes the first fault fatal.
    pub max_consecutive_faults: u32,
    /// Upper bound on the retry delay.
    pub max_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            pacing: Duration::from_millis(100),
            heartbeat_interval: Duration::from_secs(3),
            max_consecutive_faults: 5,
            max_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Disconnected,
    Connected,
    Running,
    Stopped,
}

impl LoopState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub events: usize,
    pub sent: usize,
    /// Replies lost to send faults.
    pub dropped: usize,
    pub heartbeat: bool,
}

/// Single-task scheduler driving one transport and one plugin host.
pub struct EventLoop {
    transport: Arc<dyn Transport>,
    host: PluginHost,
    config: LoopConfig,
    state: LoopState,
    faults: TransportFaults,
    last_heartbeat: Instant,
}

impl EventLoop {
    pub fn new(transport: Arc<dyn Transport>, host: PluginHost, config: LoopConfig) -> Self {
        let faults = TransportFaults::new(
            config.max_consecutive_faults,
            config.poll_interval,
            config.max_backoff,
        );
        Self {
            transport,
            host,
            config,
            state: LoopState::Disconnected,
            faults,
            last_heartbeat: Instant::now(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    pub fn faults(&self) -> &TransportFaults {
        &self.faults
    }

    /// Connect the transport and set up the plugin.
    pub async fn start(&mut self) -> Result<BotIdentity> {
        self.expect_state(LoopState::Disconnected)?;

        let identity = match self.transport.connect().await {
            Ok(identity) => identity,
            Err(e) => {
                self.state = LoopState::Stopped;
                return Err(Error::Connect(e));
            },
        };
        self.state = LoopState::Connected;
        info!(
            transport = self.transport.name(),
            bot = %identity.user_id,
            name = %identity.name,
            "transport connected"
        );

        if let Err(e) = self
            .host
            .setup(identity.clone(), Arc::clone(&self.transport))
            .await
        {
            self.state = LoopState::Stopped;
            return Err(e.into());
        }
        self.last_heartbeat = Instant::now();
        self.state = LoopState::Running;
        Ok(identity)
    }

    /// One poll, dispatch, drain and heartbeat pass.
    pub async fn tick(&mut self) -> Result<TickReport> {
        self.expect_state(LoopState::Running)?;
        let mut report = TickReport::default();

        match self.transport.read_events().await {
            Ok(events) => {
                self.faults.reset(TransportOp::Read);
                report.events = events.len();
                if !events.is_empty() {
                    debug!(count = events.len(), "events received");
                }
                for event in &events {
                    if let Err(e) = self.host.dispatch(event).await {
                        self.state = LoopState::Stopped;
                        error!(error = %e, "plugin fault in diagnostic mode");
                        return Err(e.into());
                    }
                }
            },
            Err(e) => self.fault(TransportOp::Read, e)?,
        }

        let (sent, dropped) = self.flush().await?;
        report.sent = sent;
        report.dropped = dropped;

        if self.last_heartbeat.elapsed() >= self.config.heartbeat_interval {
            match self.transport.heartbeat().await {
                Ok(()) => {
                    self.faults.reset(TransportOp::Heartbeat);
                    self.last_heartbeat = Instant::now();
                    report.heartbeat = true;
                },
                Err(e) => self.fault(TransportOp::Heartbeat, e)?,
            }
        }

        Ok(report)
    }

    /// Send every queued reply, pacing between sends. A reply that fails to
    /// send is dropped. Returns `(sent, dropped)`.
    pub async fn flush(&mut self) -> Result<(usize, usize)> {
        let mut sent = 0;
        let mut dropped = 0;
        while let Some(output) = self.host.pop_output() {
            if sent + dropped > 0 {
                tokio::time::sleep(self.config.pacing).await;
            }
            match self.transport.send(&output.channel, &output.text).await {
                Ok(()) => {
                    self.faults.reset(TransportOp::Send);
                    sent += 1;
                },
                Err(e) => {
                    dropped += 1;
                    warn!(channel = %output.channel, "dropping reply that failed to send");
                    self.fault(TransportOp::Send, e)?;
                },
            }
        }
        if sent + dropped > 0 {
            debug!(sent, dropped, "reply queue drained");
        }
        Ok((sent, dropped))
    }

    /// Tick until `cancel` fires or a fatal fault occurs, then flush pending
    /// replies once.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if self.state == LoopState::Disconnected {
            self.start().await?;
        }
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            pacing_ms = self.config.pacing.as_millis() as u64,
            heartbeat_secs = self.config.heartbeat_interval.as_secs(),
            max_consecutive_faults = self.config.max_consecutive_faults,
            "event loop running"
        );

        let result = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }
            if let Err(e) = self.tick().await {
                break Err(e);
            }
            let delay = self.faults.backoff().unwrap_or(self.config.poll_interval);
            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                _ = tokio::time::sleep(delay) => {},
            }
        };

        if result.is_ok()
            && self.host.pending() > 0
            && let Err(e) = self.flush().await
        {
            warn!(error = %e, "failed to flush replies on shutdown");
        }
        self.state = LoopState::Stopped;

        let stats = self.host.stats();
        info!(
            plugin = self.host.plugin_name(),
            calls = stats.call_count,
            failures = stats.failure_count,
            avg_latency_us = stats.avg_latency().as_micros() as u64,
            "event loop stopped"
        );
        result
    }

    /// Record a transport fault; stops the loop once `op` fails past the
    /// threshold.
    fn fault(&mut self, op: TransportOp, e: teambot_channels::Error) -> Result<()> {
        let tolerated = self.faults.record(op);
        let consecutive = self.faults.get(op).consecutive();
        if !tolerated {
            self.state = LoopState::Stopped;
            error!(
                op = op.as_str(),
                consecutive,
                error = %e,
                "too many consecutive transport faults, stopping"
            );
            return Err(Error::transport_fault(op.as_str(), consecutive, e));
        }
        warn!(
            op = op.as_str(),
            consecutive,
            retry_in_ms = self.faults.backoff().unwrap_or_default().as_millis() as u64,
            error = %e,
            "transport fault"
        );
        Ok(())
    }

    fn expect_state(&self, expected: LoopState) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState {
                state: self.state.as_str(),
                expected: expected.as_str(),
            });
        }
        Ok(())
    }
}
