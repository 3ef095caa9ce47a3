use crate::detection::RecordStatus;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<UploadMetrics>,
}

/// Upload outcome counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetrics {
    pub accepted: usize,
    pub unclassified: usize,
    pub failed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UploadMetrics::default()),
        }
    }

    pub fn record_outcome(&self, status: RecordStatus) {
        if let Ok(mut metrics) = self.inner.lock() {
            match status {
                RecordStatus::Accepted => metrics.accepted += 1,
                RecordStatus::Unclassified => metrics.unclassified += 1,
            }
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn snapshot(&self) -> UploadMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            UploadMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_each_outcome() {
        let metrics = MetricsRecorder::new();
        metrics.record_outcome(RecordStatus::Accepted);
        metrics.record_outcome(RecordStatus::Accepted);
        metrics.record_outcome(RecordStatus::Unclassified);
        metrics.record_error();
        assert_eq!(
            metrics.snapshot(),
            UploadMetrics {
                accepted: 2,
                unclassified: 1,
                failed: 1,
            }
        );
    }
}
