use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization and question activity.
#[derive(Default)]
pub struct StudyMetrics {
    materials_summarized: AtomicU64,
    summary_failures: AtomicU64,
    summary_short_circuits: AtomicU64,
    questions_answered: AtomicU64,
    question_failures: AtomicU64,
}

impl StudyMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a persisted material; `short_circuited` when no model call was needed.
    pub fn record_summary(&self, short_circuited: bool) {
        self.materials_summarized.fetch_add(1, Ordering::Relaxed);
        if short_circuited {
            self.summary_short_circuits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an upload rejected because summarization failed.
    pub fn record_summary_failure(&self) {
        self.summary_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one question.
    pub fn record_question(&self, answered: bool) {
        let counter = if answered {
            &self.questions_answered
        } else {
            &self.question_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            materials_summarized: self.materials_summarized.load(Ordering::Relaxed),
            summary_failures: self.summary_failures.load(Ordering::Relaxed),
            summary_short_circuits: self.summary_short_circuits.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            question_failures: self.question_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Materials persisted since startup.
    pub materials_summarized: u64,
    /// Uploads rejected because summarization failed.
    pub summary_failures: u64,
    /// Materials persisted without a model call (content too short).
    pub summary_short_circuits: u64,
    /// Questions answered successfully.
    pub questions_answered: u64,
    /// Questions that failed.
    pub question_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_summaries_and_questions() {
        let metrics = StudyMetrics::new();
        metrics.record_summary(false);
        metrics.record_summary(true);
        metrics.record_summary_failure();
        metrics.record_question(true);
        metrics.record_question(false);
        metrics.record_question(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.materials_summarized, 2);
        assert_eq!(snapshot.summary_short_circuits, 1);
        assert_eq!(snapshot.summary_failures, 1);
        assert_eq!(snapshot.questions_answered, 1);
        assert_eq!(snapshot.question_failures, 2);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        assert_eq!(StudyMetrics::new().snapshot(), MetricsSnapshot::default());
    }
}
