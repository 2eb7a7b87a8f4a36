use parking_lot::Mutex;
use std::collections::VecDeque;

use super::ring::percentile_of;

/// Time-indexed deque of `(event_ts_ms, latency_ms)`, pruned against
/// `now - windowMs` on every read.
pub struct LatencyWindow {
    samples: Mutex<VecDeque<(u64, u64)>>,
}

impl LatencyWindow {
    pub fn new() -> Self {
        Self { samples: Mutex::new(VecDeque::new()) }
    }

    pub fn record(&self, event_ts_ms: u64, latency_ms: u64) {
        self.samples.lock().push_back((event_ts_ms, latency_ms));
    }

    pub fn reset(&self) {
        self.samples.lock().clear();
    }

    /// Prunes entries older than `now - window_ms`, then returns a sorted
    /// snapshot of what remains.
    pub fn snapshot(&self, now_ms: u64, window_ms: u64) -> Vec<u64> {
        let window_ms = window_ms.max(1);
        let cutoff = now_ms.saturating_sub(window_ms);
        let mut samples = self.samples.lock();
        while let Some(&(ts, _)) = samples.front() {
            if ts < cutoff {
                samples.pop_front();
            } else {
                break;
            }
        }
        let mut values: Vec<u64> = samples.iter().map(|&(_, lat)| lat).collect();
        values.sort_unstable();
        values
    }

    pub fn percentile(&self, now_ms: u64, window_ms: u64, q: f64) -> u64 {
        percentile_of(&self.snapshot(now_ms, window_ms), q)
    }
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::new()
    }
}
