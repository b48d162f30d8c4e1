use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single sampled price, ordered by timestamp within a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// A local minimum flagged by the bottom detector.
///
/// `index` points back into the source price series the bottom was
/// detected in. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bottom {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub index: usize,
}

/// A screenable asset as reported by the data feed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
}
