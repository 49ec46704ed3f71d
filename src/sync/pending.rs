//! Pending interest tracking
//!
//! Every transmitted sync interest is remembered until its ack arrives or
//! its fixed lifetime runs out. Expiry is only reported, never retried:
//! the periodic retransmission loop is the sole recovery path.

use std::time::Duration;

use tokio::time::Instant;

/// One outbound interest awaiting its ack
#[derive(Debug, Clone)]
pub struct PendingInterest {
    /// Interest name
    pub name: String,
    /// Time the interest was handed to the transport
    pub sent_at: Instant,
}

impl PendingInterest {
    /// Check if the interest outlived `lifetime` at `now`
    pub fn is_expired(&self, lifetime: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.sent_at) >= lifetime
    }
}

/// Table of interests awaiting acks
///
/// Also keeps a smoothed round-trip estimate (RFC 6298 weights) from the
/// acks that do arrive, for diagnostics.
#[derive(Debug)]
pub struct PendingInterests {
    pending: Vec<PendingInterest>,
    lifetime: Duration,
    srtt: Option<Duration>,
    rttvar: Option<Duration>,
}

impl PendingInterests {
    /// Create a table with a fixed interest lifetime
    pub fn new(lifetime: Duration) -> Self {
        Self {
            pending: Vec::new(),
            lifetime,
            srtt: None,
            rttvar: None,
        }
    }

    /// Interest lifetime
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Remember an interest sent at `now`
    pub fn register(&mut self, name: impl Into<String>, now: Instant) {
        let name = name.into();
        // Names carry a timestamp, so a duplicate is the same emission
        if self.pending.iter().any(|p| p.name == name) {
            return;
        }
        self.pending.push(PendingInterest { name, sent_at: now });
    }

    /// Match an ack against its interest
    ///
    /// Returns the round-trip time if the interest was still pending.
    pub fn satisfy(&mut self, name: &str, now: Instant) -> Option<Duration> {
        let index = self.pending.iter().position(|p| p.name == name)?;
        let pending = self.pending.swap_remove(index);
        let rtt = now.saturating_duration_since(pending.sent_at);
        self.update_rtt(rtt);
        Some(rtt)
    }

    /// Remove and return every interest that outlived its lifetime
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let lifetime = self.lifetime;
        let mut expired = Vec::new();
        self.pending.retain(|pending| {
            if pending.is_expired(lifetime, now) {
                expired.push(pending.name.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    fn update_rtt(&mut self, rtt: Duration) {
        match (self.srtt, self.rttvar) {
            (Some(srtt), Some(rttvar)) => {
                let srtt_secs = srtt.as_secs_f64();
                let rtt_secs = rtt.as_secs_f64();
                let rttvar_secs = 0.75 * rttvar.as_secs_f64() + 0.25 * (srtt_secs - rtt_secs).abs();
                let srtt_secs = 0.875 * srtt_secs + 0.125 * rtt_secs;

                self.srtt = Some(Duration::from_secs_f64(srtt_secs));
                self.rttvar = Some(Duration::from_secs_f64(rttvar_secs));
            }
            _ => {
                self.srtt = Some(rtt);
                self.rttvar = Some(rtt / 2);
            }
        }
    }

    /// Smoothed ack round-trip time, once sampled
    pub fn srtt(&self) -> Option<Duration> {
        self.srtt
    }

    /// Round-trip variance, once sampled
    pub fn rttvar(&self) -> Option<Duration> {
        self.rttvar
    }

    /// Number of interests awaiting acks
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if no interest is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFETIME: Duration = Duration::from_millis(1000);

    #[test]
    fn test_register_dedups() {
        let mut table = PendingInterests::new(LIFETIME);
        let now = Instant::now();

        table.register("/sync/1/1-1/1", now);
        table.register("/sync/1/1-1/1", now);
        table.register("/sync/1/1-1/2", now);

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_satisfy_returns_rtt() {
        let mut table = PendingInterests::new(LIFETIME);
        let start = Instant::now();
        table.register("/sync/1/1-1/1", start);

        let rtt = table.satisfy("/sync/1/1-1/1", start + Duration::from_millis(40));
        assert_eq!(rtt, Some(Duration::from_millis(40)));
        assert!(table.is_empty());
        assert_eq!(table.srtt(), Some(Duration::from_millis(40)));
        assert_eq!(table.rttvar(), Some(Duration::from_millis(20)));

        // Second ack for the same name is unmatched
        assert!(table.satisfy("/sync/1/1-1/1", start).is_none());
    }

    #[test]
    fn test_srtt_smoothing() {
        let mut table = PendingInterests::new(LIFETIME);
        let start = Instant::now();

        table.register("a", start);
        table.satisfy("a", start + Duration::from_millis(80));
        table.register("b", start);
        table.satisfy("b", start + Duration::from_millis(160));

        // 0.875 * 80 + 0.125 * 160
        let srtt = table.srtt().unwrap();
        assert!((srtt.as_secs_f64() - 0.090).abs() < 1e-9);
    }

    #[test]
    fn test_expire() {
        let mut table = PendingInterests::new(LIFETIME);
        let start = Instant::now();

        table.register("old", start);
        table.register("new", start + Duration::from_millis(600));

        assert!(table.expire(start + Duration::from_millis(999)).is_empty());

        let expired = table.expire(start + Duration::from_millis(1000));
        assert_eq!(expired, vec!["old".to_string()]);
        assert_eq!(table.len(), 1);

        let expired = table.expire(start + Duration::from_millis(1600));
        assert_eq!(expired, vec!["new".to_string()]);
        assert!(table.is_empty());
    }
}
