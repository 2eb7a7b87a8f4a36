use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed-capacity cumulative latency ring. Writers never block each other; a
/// reader computing percentiles may observe a torn interleaving of up to
/// `CAPACITY - 1` samples mid-wrap, which is acceptable for percentile
/// estimation per spec.
pub struct LatencyRing {
    capacity: usize,
    buf: Mutex<Vec<u64>>,
    write_idx: AtomicU64,
    len: AtomicU64,
}

impl LatencyRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buf: Mutex::new(vec![0u64; capacity]),
            write_idx: AtomicU64::new(0),
            len: AtomicU64::new(0),
        }
    }

    pub fn record(&self, latency_ms: u64) {
        let idx = self.write_idx.fetch_add(1, Ordering::Relaxed) as usize % self.capacity;
        self.buf.lock()[idx] = latency_ms;
        let len = self.len.load(Ordering::Relaxed);
        if (len as usize) < self.capacity {
            self.len.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        self.buf.lock().iter_mut().for_each(|v| *v = 0);
        self.write_idx.store(0, Ordering::Relaxed);
        self.len.store(0, Ordering::Relaxed);
    }

    /// Sorted snapshot of the currently populated prefix.
    fn sorted_samples(&self) -> Vec<u64> {
        let len = (self.len.load(Ordering::Relaxed) as usize).min(self.capacity);
        let buf = self.buf.lock();
        let mut samples: Vec<u64> = buf[..len].to_vec();
        samples.sort_unstable();
        samples
    }

    pub fn percentile(&self, q: f64) -> u64 {
        let samples = self.sorted_samples();
        percentile_of(&samples, q)
    }

    pub fn p95(&self) -> u64 {
        self.percentile(0.95)
    }

    pub fn p99(&self) -> u64 {
        self.percentile(0.99)
    }
}

/// Nearest-rank percentile: index `max(0, floor(n*q) - 1)` of a sorted slice.
/// `samples` must already be sorted ascending. Returns 0 for an empty input.
pub fn percentile_of(samples: &[u64], q: f64) -> u64 {
    let n = samples.len();
    if n == 0 {
        return 0;
    }
    let raw_idx = (n as f64 * q).floor() as i64 - 1;
    let idx = raw_idx.max(0) as usize;
    samples[idx.min(n - 1)]
}
