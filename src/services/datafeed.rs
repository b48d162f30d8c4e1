use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::business_logic::config::ScreenerConfig;
use crate::errors::ScanError;
use crate::models::price::{Asset, PricePoint};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Market data provider consumed by the scanner.
#[async_trait]
pub trait DataFeed: Send + Sync {
    /// Assets passing the configured minimum 24h volume and market cap.
    async fn list_eligible_assets(&self) -> Result<Vec<Asset>, ScanError>;

    /// Price history for one asset over the configured window, sampled at
    /// the configured interval, ascending by timestamp.
    async fn price_history(&self, asset_id: &str) -> Result<Vec<PricePoint>, ScanError>;
}

#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    /// `[epoch_ms, price]` pairs
    prices: Vec<(i64, f64)>,
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    min_volume_usd: f64,
    min_market_cap_usd: f64,
    history_window_days: u32,
    interval_hours: u32,
}

impl CoinGeckoClient {
    pub fn new(config: &ScreenerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            min_volume_usd: config.min_volume_usd,
            min_market_cap_usd: config.min_market_cap_usd,
            history_window_days: config.history_window_days,
            interval_hours: config.interval_hours,
        }
    }
}

#[async_trait]
impl DataFeed for CoinGeckoClient {
    async fn list_eligible_assets(&self) -> Result<Vec<Asset>, ScanError> {
        let url = format!(
            "{COINGECKO_API_URL}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&page=1"
        );
        let rows = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<MarketRow>>()
            .await?;

        // Rows with null price/cap/volume are delisted or stale; skip them.
        let assets = rows
            .into_iter()
            .filter_map(|row| {
                Some(Asset {
                    id: row.id,
                    symbol: row.symbol.to_uppercase(),
                    current_price: row.current_price?,
                    market_cap: row.market_cap?,
                    volume_24h: row.total_volume?,
                })
            })
            .filter(|a| {
                a.volume_24h >= self.min_volume_usd && a.market_cap >= self.min_market_cap_usd
            })
            .collect();

        Ok(assets)
    }

    async fn price_history(&self, asset_id: &str) -> Result<Vec<PricePoint>, ScanError> {
        let url = format!(
            "{COINGECKO_API_URL}/coins/{asset_id}/market_chart?vs_currency=usd&days={}",
            self.history_window_days
        );
        let chart = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<MarketChart>()
            .await?;

        points_from_chart(chart, self.interval_hours)
    }
}

/// Convert a provider chart to price points, downsampled to the interval.
/// The provider delivers hourly samples for multi-week windows; one point
/// per interval is kept, starting from the first.
fn points_from_chart(chart: MarketChart, interval_hours: u32) -> Result<Vec<PricePoint>, ScanError> {
    let interval_ms = i64::from(interval_hours) * 3_600_000;
    let mut points: Vec<PricePoint> = Vec::new();
    let mut last_kept_ms: Option<i64> = None;

    for (ms, price) in chart.prices {
        if let Some(last) = last_kept_ms {
            if ms <= last {
                return Err(ScanError::DataFormat(format!(
                    "price history not ascending at {ms}"
                )));
            }
            if ms - last < interval_ms {
                continue;
            }
        }

        let timestamp = Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| ScanError::DataFormat(format!("bad timestamp {ms}")))?;
        points.push(PricePoint { timestamp, price });
        last_kept_ms = Some(ms);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_chart_parsing_and_downsampling() {
        let body = r#"{
            "prices": [
                [1704067200000, 42000.0],
                [1704070800000, 42100.0],
                [1704074400000, 42050.0],
                [1704078000000, 42200.0],
                [1704081600000, 42300.0]
            ],
            "market_caps": [],
            "total_volumes": []
        }"#;

        let chart: MarketChart = serde_json::from_str(body).unwrap();
        let points = points_from_chart(chart, 4).unwrap();

        // Hourly input sampled every 4h keeps the first and the fifth
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, 42000.0);
        assert_eq!(points[1].price, 42300.0);
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn test_non_ascending_history_is_format_error() {
        let chart = MarketChart {
            prices: vec![(1_704_081_600_000, 42000.0), (1_704_067_200_000, 42100.0)],
        };
        let result = points_from_chart(chart, 1);
        assert!(matches!(result, Err(ScanError::DataFormat(_))));
    }

    #[test]
    fn test_market_rows_with_nulls_are_skipped() {
        let body = r#"[
            {"id": "bitcoin", "symbol": "btc", "current_price": 42000.0,
             "market_cap": 800000000000.0, "total_volume": 20000000000.0},
            {"id": "stale", "symbol": "stl", "current_price": null,
             "market_cap": null, "total_volume": null}
        ]"#;

        let rows: Vec<MarketRow> = serde_json::from_str(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].current_price.is_none());
    }
}
