//! Batch progress accounting.

use serde::Serialize;

use crate::types::Timestamp;

/// Task counts of a batch, aggregated by `processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub processed: i64,
    pub total: i64,
}

/// Fraction of a batch that is done, in `[0, 1]`.
///
/// A completed batch is always `1`, whatever its task counts say. A batch
/// without tasks is vacuously complete.
pub fn batch_progress(completed_on: Option<Timestamp>, counts: TaskCounts) -> f64 {
    if completed_on.is_some() || counts.total <= 0 {
        return 1.0;
    }
    let processed = counts.processed.clamp(0, counts.total);
    processed as f64 / counts.total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn empty_batch_is_complete() {
        assert_eq!(batch_progress(None, TaskCounts::default()), 1.0);
    }

    #[test]
    fn half_processed_batch() {
        let counts = TaskCounts {
            processed: 1,
            total: 2,
        };
        assert_eq!(batch_progress(None, counts), 0.5);
    }

    #[test]
    fn completed_batch_ignores_counts() {
        let counts = TaskCounts {
            processed: 0,
            total: 7,
        };
        assert_eq!(batch_progress(Some(Utc::now()), counts), 1.0);
    }

    #[test]
    fn nothing_processed_is_zero() {
        let counts = TaskCounts {
            processed: 0,
            total: 3,
        };
        assert_eq!(batch_progress(None, counts), 0.0);
    }
}
