use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,
    total_build_time_us: AtomicU64,
    total_analysis_time_us: AtomicU64,

    // Counts
    extractions: AtomicUsize,
    builds: AtomicUsize,
    analyses: AtomicUsize,
    total_entities_extracted: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_extract(&self, duration: Duration, entities: usize) {
        self.total_extract_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.extractions.fetch_add(1, Ordering::Relaxed);
        self.total_entities_extracted
            .fetch_add(entities, Ordering::Relaxed);
    }

    pub fn record_build(&self, duration: Duration) {
        self.total_build_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    /// Similarity or clustering run
    pub fn record_analysis(&self, duration: Duration) {
        self.total_analysis_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            avg_extract_time_ms: avg_time_ms(&self.total_extract_time_us, &self.extractions),
            avg_build_time_ms: avg_time_ms(&self.total_build_time_us, &self.builds),
            avg_analysis_time_ms: avg_time_ms(&self.total_analysis_time_us, &self.analyses),
            extractions: self.extractions.load(Ordering::Relaxed),
            total_entities_extracted: self.total_entities_extracted.load(Ordering::Relaxed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub avg_extract_time_ms: f64,
    pub avg_build_time_ms: f64,
    pub avg_analysis_time_ms: f64,
    pub extractions: usize,
    pub total_entities_extracted: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages() {
        let metrics = Metrics::new();
        metrics.record_request(true);
        metrics.record_request(false);
        metrics.record_extract(Duration::from_millis(4), 10);
        metrics.record_extract(Duration::from_millis(2), 5);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.extractions, 2);
        assert_eq!(snapshot.total_entities_extracted, 15);
        assert!((snapshot.avg_extract_time_ms - 3.0).abs() < 1e-9);
        assert_eq!(snapshot.avg_build_time_ms, 0.0);
    }
}
