use std::time::Duration;

/// Counts consecutive transport faults and computes the retry delay.
///
/// The delay doubles with each fault, starting at `base` and capped at `max`.
#[derive(Debug, Clone)]
pub struct FaultTracker {
    consecutive: u32,
    threshold: u32,
    base: Duration,
    max: Duration,
}

impl FaultTracker {
    pub fn new(threshold: u32, base: Duration, max: Duration) -> Self {
        Self {
            consecutive: 0,
            threshold,
            base,
            max: max.max(base),
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Record one fault. Returns false once the count exceeds the threshold.
    pub fn record(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive <= self.threshold
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Delay before the next attempt, or `None` when no fault is pending.
    pub fn backoff(&self) -> Option<Duration> {
        if self.consecutive == 0 {
            return None;
        }
        let shift = (self.consecutive - 1).min(16);
        Some(self.base.saturating_mul(1_u32 << shift).min(self.max))
    }
}

/// Transport calls the loop tracks faults for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    Read,
    Send,
    Heartbeat,
}

impl TransportOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Send => "send",
            Self::Heartbeat => "heartbeat",
        }
    }
}

/// One [`FaultTracker`] per [`TransportOp`].
///
/// A success only clears the count of the same operation, so a healthy read
/// never hides a send or heartbeat that keeps failing.
#[derive(Debug, Clone)]
pub struct TransportFaults {
    read: FaultTracker,
    send: FaultTracker,
    heartbeat: FaultTracker,
}

impl TransportFaults {
    pub fn new(threshold: u32, base: Duration, max: Duration) -> Self {
        let tracker = FaultTracker::new(threshold, base, max);
        Self {
            read: tracker.clone(),
            send: tracker.clone(),
            heartbeat: tracker,
        }
    }

    pub fn get(&self, op: TransportOp) -> &FaultTracker {
        match op {
            TransportOp::Read => &self.read,
            TransportOp::Send => &self.send,
            TransportOp::Heartbeat => &self.heartbeat,
        }
    }

    fn get_mut(&mut self, op: TransportOp) -> &mut FaultTracker {
        match op {
            TransportOp::Read => &mut self.read,
            TransportOp::Send => &mut self.send,
            TransportOp::Heartbeat => &mut self.heartbeat,
        }
    }

    /// Record one fault of `op`. Returns false once its count exceeds the
    /// threshold.
    pub fn record(&mut self, op: TransportOp) -> bool {
        self.get_mut(op).record()
    }

    pub fn reset(&mut self, op: TransportOp) {
        self.get_mut(op).reset();
    }

    /// Longest pending delay across all operations.
    pub fn backoff(&self) -> Option<Duration> {
        [&self.read, &self.send, &self.heartbeat]
            .into_iter()
            .filter_map(FaultTracker::backoff)
            .max()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn backoff_doubles_and_caps() {
        let mut t = FaultTracker::new(10, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(t.backoff(), None);

        let delays: Vec<_> = (0..5)
            .map(|_| {
                t.record();
                t.backoff().unwrap_or_default().as_millis()
            })
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);

        t.reset();
        assert_eq!(t.backoff(), None);
        assert_eq!(t.consecutive(), 0);
    }

    #[rstest]
    #[case::first_fault_fatal(0, 1)]
    #[case::tolerates_two(2, 3)]
    fn threshold_cases(#[case] threshold: u32, #[case] fatal_at: u32) {
        let mut t = FaultTracker::new(threshold, Duration::ZERO, Duration::ZERO);
        for n in 1..fatal_at {
            assert!(t.record(), "fault {n} should be tolerated");
        }
        assert!(!t.record());
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let mut t = FaultTracker::new(u32::MAX, Duration::from_secs(1), Duration::from_secs(30));
        for _ in 0..100 {
            t.record();
        }
        assert_eq!(t.backoff(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn success_only_clears_its_own_operation() {
        let mut faults = TransportFaults::new(2, Duration::from_millis(10), Duration::from_secs(1));
        assert!(faults.record(TransportOp::Send));
        assert!(faults.record(TransportOp::Send));

        faults.reset(TransportOp::Read);
        faults.reset(TransportOp::Heartbeat);
        assert_eq!(faults.get(TransportOp::Send).consecutive(), 2);
        assert!(!faults.record(TransportOp::Send));
        assert_eq!(faults.get(TransportOp::Read).consecutive(), 0);
    }

    #[test]
    fn backoff_follows_the_worst_operation() {
        let mut faults = TransportFaults::new(10, Duration::from_millis(10), Duration::from_secs(1));
        assert_eq!(faults.backoff(), None);

        faults.record(TransportOp::Read);
        faults.record(TransportOp::Heartbeat);
        faults.record(TransportOp::Heartbeat);
        faults.record(TransportOp::Heartbeat);
        assert_eq!(faults.backoff(), Some(Duration::from_millis(40)));

        faults.reset(TransportOp::Heartbeat);
        assert_eq!(faults.backoff(), Some(Duration::from_millis(10)));
    }
}
