use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::price::Bottom;

/// A validated double bottom.
///
/// Invariant: `first_bottom.timestamp < second_bottom.timestamp`. The
/// neckline is the highest sampled price strictly between the two bottoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub first_bottom: Bottom,
    pub second_bottom: Bottom,
    pub neckline: f64,
    /// Relative price difference between the two bottoms,
    /// `|p1 - p2| / p1`.
    pub depth: f64,
    pub timespan_days: f64,
}

/// Alert grades, in the priority order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertTier {
    /// Second bottom forming: price still near the second trough.
    Yellow,
    /// Pattern completed: price below the neckline buffer.
    Orange,
    /// Breakout imminent: price at or above the neckline buffer.
    Red,
    /// No tier matched (only possible for non-finite prices).
    None,
}

/// Recorded outcome of a past pattern, fed back by an external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// One append-only entry in the confidence estimator's store.
#[derive(Debug, Clone, Copy)]
pub struct LearningRecord {
    pub depth: f64,
    pub outcome: Outcome,
}

/// Everything handed to the notifier for a detected pattern.
#[derive(Debug, Clone)]
pub struct PatternAlert {
    pub symbol: String,
    pub current_price: f64,
    pub neckline: f64,
    pub depth: f64,
    pub timespan_days: f64,
    pub confidence: f64,
    pub tier: AlertTier,
    pub stop_loss: f64,
    pub target_gain_fraction: f64,
}

/// Per-asset status exposed over the API after each completed cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssetPatternStatus {
    pub symbol: String,
    pub current_price: f64,
    pub first_bottom_price: Option<f64>,
    pub second_bottom_price: Option<f64>,
    pub neckline_price: Option<f64>,
    pub depth: Option<f64>,
    pub timespan_days: Option<f64>,
    pub confidence: Option<f64>,
    pub tier: Option<AlertTier>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoubleBottomResponse {
    pub patterns: Vec<AssetPatternStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanSnapshot {
    pub as_of_ms: u64,
    pub patterns: Vec<AssetPatternStatus>,
}
