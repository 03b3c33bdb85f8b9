//! Process-wide counters and derived status figures.
//!
//! Counters are atomics mutated on the relevant transition (message relayed,
//! connection accepted, broadcast frame dropped) and read from anywhere.
//! They reset only on process restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::RwLock;

pub struct Metrics {
    started_at: Instant,
    messages_sent: AtomicU64,
    connections_total: AtomicU64,
    peak_users: AtomicU64,
    broadcast_drops: AtomicU64,
    system_info: RwLock<System>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages_sent: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            peak_users: AtomicU64::new(0),
            broadcast_drops: AtomicU64::new(0),
            system_info: RwLock::new(System::new()),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn record_message(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Record an accepted connection and raise the peak-user mark if the
    /// current population exceeds it.
    pub fn record_connection(&self, current_users: u64) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.peak_users.fetch_max(current_users, Ordering::Relaxed);
    }

    pub fn connections_total(&self) -> u64 {
        self.connections_total.load(Ordering::Relaxed)
    }

    pub fn peak_users(&self) -> u64 {
        self.peak_users.load(Ordering::Relaxed)
    }

    pub fn record_broadcast_drop(&self) {
        self.broadcast_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn broadcast_drops(&self) -> u64 {
        self.broadcast_drops.load(Ordering::Relaxed)
    }

    /// Average relayed messages per second since startup, rounded to two
    /// decimals.
    pub fn messages_per_second(&self) -> f64 {
        let uptime = self.uptime_seconds();
        if uptime == 0 {
            return 0.0;
        }
        let raw = self.messages_sent() as f64 / uptime as f64;
        (raw * 100.0).round() / 100.0
    }

    /// Best-effort resident memory of this process in MB, rounded to two
    /// decimals. Returns 0.0 where the platform gives no answer.
    pub async fn memory_mb(&self) -> f64 {
        let mut sys = self.system_info.write().await;
        let pid = sysinfo::Pid::from_u32(std::process::id());
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let raw = sys
            .process(pid)
            .map(|p| p.memory() as f64 / 1024.0 / 1024.0)
            .unwrap_or(0.0);
        (raw * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        // given:
        let metrics = Metrics::new();

        // then:
        assert_eq!(metrics.messages_sent(), 0);
        assert_eq!(metrics.connections_total(), 0);
        assert_eq!(metrics.peak_users(), 0);
        assert_eq!(metrics.broadcast_drops(), 0);
        assert_eq!(metrics.messages_per_second(), 0.0);
    }

    #[test]
    fn test_record_message_increments() {
        // given:
        let metrics = Metrics::new();

        // when:
        metrics.record_message();
        metrics.record_message();

        // then:
        assert_eq!(metrics.messages_sent(), 2);
    }

    #[test]
    fn test_peak_users_is_monotonic() {
        // given:
        let metrics = Metrics::new();

        // when: population rises to 3, falls, rises to 2
        metrics.record_connection(1);
        metrics.record_connection(2);
        metrics.record_connection(3);
        metrics.record_connection(1);
        metrics.record_connection(2);

        // then:
        assert_eq!(metrics.peak_users(), 3);
        assert_eq!(metrics.connections_total(), 5);
    }

    #[tokio::test]
    async fn test_memory_mb_is_non_negative() {
        // given:
        let metrics = Metrics::new();

        // when:
        let memory = metrics.memory_mb().await;

        // then:
        assert!(memory >= 0.0);
    }
}
