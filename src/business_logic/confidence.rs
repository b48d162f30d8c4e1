use tokio::sync::RwLock;

use crate::models::pattern::{LearningRecord, Outcome, Pattern};

/// Depth radius for a record to count as a neighbor of the query.
const DEPTH_RADIUS: f64 = 0.10;

/// Score returned when no neighbor has been recorded.
const NEUTRAL: f64 = 0.5;

/// Adaptive confidence score over past pattern outcomes.
///
/// The store is append-only and lives for the process lifetime. Similarity
/// is nearest-neighbor on depth alone; timespan, symbol and market context
/// are deliberately ignored. Reads and writes can interleave freely: the
/// caller shares one estimator across the scanner and the outcome feed.
#[derive(Debug, Default)]
pub struct ConfidenceEstimator {
    records: RwLock<Vec<LearningRecord>>,
}

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Success ratio among records within [`DEPTH_RADIUS`] of the pattern's
    /// depth, or 0.5 when none exist. Never errors on empty history.
    pub async fn predict(&self, pattern: &Pattern) -> f64 {
        self.predict_depth(pattern.depth).await
    }

    pub async fn predict_depth(&self, depth: f64) -> f64 {
        let records = self.records.read().await;
        let matches: Vec<&LearningRecord> = records
            .iter()
            .filter(|r| (r.depth - depth).abs() < DEPTH_RADIUS)
            .collect();

        if matches.is_empty() {
            return NEUTRAL;
        }

        let successes = matches
            .iter()
            .filter(|r| r.outcome == Outcome::Success)
            .count();
        successes as f64 / matches.len() as f64
    }

    /// Append an observed outcome for a pattern depth.
    pub async fn learn(&self, depth: f64, outcome: Outcome) {
        let mut records = self.records.write().await;
        records.push(LearningRecord { depth, outcome });
        tracing::debug!(
            "Learned outcome {:?} for depth {:.4} ({} records total)",
            outcome,
            depth,
            records.len()
        );
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}
