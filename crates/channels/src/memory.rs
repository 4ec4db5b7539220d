//! In-process transport.
//!
//! Inbound traffic is scripted as batches, outbound traffic is recorded, and
//! faults can be injected per operation. Used to drive the event loop and the
//! roster processor without a network.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
    time::Instant,
};

use {async_trait::async_trait, tracing::debug};

use crate::{
    Error, Result,
    event::{BotIdentity, ChannelId, Event, OutputMessage, UserId},
    transport::Transport,
};

#[derive(Default)]
struct Inner {
    connected: bool,
    inbound: VecDeque<Vec<Event>>,
    sent: Vec<(OutputMessage, Instant)>,
    heartbeats: Vec<Instant>,
    members: HashMap<ChannelId, HashSet<UserId>>,
    read_faults: usize,
    send_faults: usize,
    heartbeat_faults: usize,
    member_faults: usize,
    member_queries: usize,
}

/// Loopback [`Transport`] backed by in-memory queues.
pub struct MemoryTransport {
    identity: BotIdentity,
    inner: Mutex<Inner>,
}

impl MemoryTransport {
    pub fn new(identity: BotIdentity) -> Self {
        Self {
            identity,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Queue a batch returned by one future `read_events` call.
    pub fn push_batch(&self, events: Vec<Event>) {
        self.lock().inbound.push_back(events);
    }

    /// Queue a single-event batch.
    pub fn push(&self, event: Event) {
        self.push_batch(vec![event]);
    }

    /// Replace the member list reported for `channel`.
    pub fn set_members<I, U>(&self, channel: impl Into<ChannelId>, members: I)
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.lock().members.insert(channel.into(), members);
    }

    /// Make the next `count` reads fail.
    pub fn fail_reads(&self, count: usize) {
        self.lock().read_faults = count;
    }

    /// Make the next `count` sends fail.
    pub fn fail_sends(&self, count: usize) {
        self.lock().send_faults = count;
    }

    /// Make the next `count` heartbeats fail.
    pub fn fail_heartbeats(&self, count: usize) {
        self.lock().heartbeat_faults = count;
    }

    /// Make the next `count` member lookups fail.
    pub fn fail_member_queries(&self, count: usize) {
        self.lock().member_faults = count;
    }

    /// Everything sent so far, in send order.
    pub fn sent(&self) -> Vec<OutputMessage> {
        self.lock().sent.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Send timestamps, in send order.
    pub fn sent_at(&self) -> Vec<Instant> {
        self.lock().sent.iter().map(|(_, at)| *at).collect()
    }

    pub fn heartbeat_count(&self) -> usize {
        self.lock().heartbeats.len()
    }

    pub fn member_query_count(&self) -> usize {
        self.lock().member_queries
    }

    /// True once every scripted batch has been read.
    pub fn is_drained(&self) -> bool {
        self.lock().inbound.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

fn take_fault(counter: &mut usize, op: &str) -> Result<()> {
    if *counter > 0 {
        *counter -= 1;
        return Err(Error::disconnected(format!("injected {op} fault")));
    }
    Ok(())
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self) -> Result<BotIdentity> {
        self.lock().connected = true;
        debug!(bot = %self.identity.user_id, "memory transport connected");
        Ok(self.identity.clone())
    }

    async fn read_events(&self) -> Result<Vec<Event>> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        take_fault(&mut inner.read_faults, "read")?;
        Ok(inner.inbound.pop_front().unwrap_or_default())
    }

    async fn send(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        take_fault(&mut inner.send_faults, "send")?;
        inner
            .sent
            .push((OutputMessage::new(channel.clone(), text), Instant::now()));
        Ok(())
    }

    async fn heartbeat(&self) -> Result<()> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        take_fault(&mut inner.heartbeat_faults, "heartbeat")?;
        inner.heartbeats.push(Instant::now());
        Ok(())
    }

    async fn channel_members(&self, channel: &ChannelId) -> Result<HashSet<UserId>> {
        let mut inner = self.lock();
        inner.member_queries += 1;
        take_fault(&mut inner.member_faults, "channel_members")?;
        Ok(inner.members.get(channel).cloned().unwrap_or_default())
    }
}
