use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{interval, Duration};

use crate::business_logic::alerts::{classify, stop_loss, target_gain_fraction};
use crate::business_logic::bottoms::find_bottoms;
use crate::business_logic::confidence::ConfidenceEstimator;
use crate::business_logic::config::ScreenerConfig;
use crate::business_logic::double_bottom::PatternValidator;
use crate::errors::ScanError;
use crate::models::pattern::{AssetPatternStatus, PatternAlert, ScanSnapshot};
use crate::models::price::Asset;
use crate::services::datafeed::DataFeed;
use crate::services::notifier::Notifier;
use crate::services::scan_state::SharedScanState;

/// Periodic screening service covering all eligible assets.
pub struct ScannerService {
    feed: Arc<dyn DataFeed>,
    notifier: Arc<dyn Notifier>,
    estimator: Arc<ConfidenceEstimator>,
    validator: PatternValidator,
    config: ScreenerConfig,
    shared_state: SharedScanState,
    cycle_guard: Mutex<()>,
}

impl ScannerService {
    pub fn new(
        feed: Arc<dyn DataFeed>,
        notifier: Arc<dyn Notifier>,
        estimator: Arc<ConfidenceEstimator>,
        config: ScreenerConfig,
        shared_state: SharedScanState,
    ) -> Self {
        Self {
            feed,
            notifier,
            estimator,
            validator: PatternValidator::new(&config),
            config,
            shared_state,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Run cycles forever on the configured period. The first tick fires
    /// immediately at startup.
    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_secs(self.config.cycle_minutes * 60));

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One guarded cycle. A tick arriving while a cycle is still running is
    /// skipped so at most one cycle is ever in flight.
    pub async fn tick(&self) {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            tracing::warn!("Previous scan cycle still in progress, skipping tick");
            return;
        };

        match self.run_cycle().await {
            Ok(count) => tracing::info!("Scan cycle complete, {} assets screened", count),
            Err(e) => tracing::error!("Scan cycle aborted: {}", e),
        }
    }

    /// Process every eligible asset sequentially. Any error aborts the
    /// whole cycle; no retries, no per-asset isolation.
    async fn run_cycle(&self) -> Result<usize, ScanError> {
        let assets = self.feed.list_eligible_assets().await?;
        tracing::debug!("{} assets eligible for screening", assets.len());

        let mut statuses = Vec::with_capacity(assets.len());
        for asset in &assets {
            statuses.push(self.scan_asset(asset).await?);
        }

        let count = statuses.len();
        self.publish(statuses).await;
        Ok(count)
    }

    async fn scan_asset(&self, asset: &Asset) -> Result<AssetPatternStatus, ScanError> {
        let prices = self.feed.price_history(&asset.id).await?;
        let bottoms = find_bottoms(&prices);
        let pattern = self.validator.validate(&prices, &bottoms)?;

        let Some(pattern) = pattern else {
            return Ok(AssetPatternStatus {
                symbol: asset.symbol.clone(),
                current_price: asset.current_price,
                first_bottom_price: None,
                second_bottom_price: None,
                neckline_price: None,
                depth: None,
                timespan_days: None,
                confidence: None,
                tier: None,
                summary: format!(
                    "{}: no double bottom in the last {} days ({} local minima).",
                    asset.symbol,
                    self.config.history_window_days,
                    bottoms.len()
                ),
            });
        };

        let confidence = self.estimator.predict(&pattern).await;
        let tier = classify(asset.current_price, &pattern);

        let alert = PatternAlert {
            symbol: asset.symbol.clone(),
            current_price: asset.current_price,
            neckline: pattern.neckline,
            depth: pattern.depth,
            timespan_days: pattern.timespan_days,
            confidence,
            tier,
            stop_loss: stop_loss(&pattern),
            target_gain_fraction: target_gain_fraction(asset.current_price, &pattern),
        };
        self.notifier.notify(&alert).await;

        Ok(AssetPatternStatus {
            symbol: asset.symbol.clone(),
            current_price: asset.current_price,
            first_bottom_price: Some(pattern.first_bottom.price),
            second_bottom_price: Some(pattern.second_bottom.price),
            neckline_price: Some(pattern.neckline),
            depth: Some(pattern.depth),
            timespan_days: Some(pattern.timespan_days),
            confidence: Some(confidence),
            tier: Some(tier),
            summary: format!(
                "{}: double bottom at ${:.2}/${:.2}, neckline ${:.2}, confidence {:.0}%.",
                asset.symbol,
                pattern.first_bottom.price,
                pattern.second_bottom.price,
                pattern.neckline,
                confidence * 100.0
            ),
        })
    }

    async fn publish(&self, mut statuses: Vec<AssetPatternStatus>) {
        // Sort by symbol for consistent ordering
        statuses.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let snapshot = ScanSnapshot {
            as_of_ms: chrono::Utc::now().timestamp_millis() as u64,
            patterns: statuses.clone(),
        };

        let mut state = self.shared_state.patterns.write().await;
        *state = statuses;
        let _ = self.shared_state.broadcaster.send(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pattern::AlertTier;
    use crate::models::price::PricePoint;
    use crate::services::scan_state::new_shared_state;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct StaticFeed {
        assets: Vec<Asset>,
        prices: Vec<PricePoint>,
    }

    #[async_trait]
    impl DataFeed for StaticFeed {
        async fn list_eligible_assets(&self) -> Result<Vec<Asset>, ScanError> {
            Ok(self.assets.clone())
        }

        async fn price_history(&self, _asset_id: &str) -> Result<Vec<PricePoint>, ScanError> {
            Ok(self.prices.clone())
        }
    }

    struct FailingFeed;

    /// Blocks inside `list_eligible_assets` until released, counting calls.
    struct BlockingFeed {
        calls: AtomicUsize,
        entered_tx: mpsc::Sender<()>,
        release_rx: Mutex<mpsc::Receiver<()>>,
    }

    #[async_trait]
    impl DataFeed for BlockingFeed {
        async fn list_eligible_assets(&self) -> Result<Vec<Asset>, ScanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.entered_tx.send(()).await;
            let _ = self.release_rx.lock().await.recv().await;
            Ok(Vec::new())
        }

        async fn price_history(&self, _asset_id: &str) -> Result<Vec<PricePoint>, ScanError> {
            unreachable!()
        }
    }

    #[async_trait]
    impl DataFeed for FailingFeed {
        async fn list_eligible_assets(&self) -> Result<Vec<Asset>, ScanError> {
            Err(ScanError::DataFetch("provider unreachable".into()))
        }

        async fn price_history(&self, _asset_id: &str) -> Result<Vec<PricePoint>, ScanError> {
            unreachable!()
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<PatternAlert>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, alert: &PatternAlert) {
            self.alerts.lock().await.push(alert.clone());
        }
    }

    /// 60 days of 4h samples: troughs at day 10 ($100) and day 40 ($102).
    fn double_bottom_series() -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut prices: Vec<f64> = Vec::new();
        for i in 0..60 {
            prices.push(110.0 - i as f64 * (10.0 / 60.0));
        }
        prices.push(100.0);
        for i in 1..=119 {
            prices.push(100.0 + i as f64 * (15.0 / 120.0));
        }
        for i in 1..=60 {
            prices.push(115.0 - i as f64 * (12.8 / 60.0));
        }
        prices.push(102.0);
        for i in 1..=119 {
            prices.push(102.0 + i as f64 * (16.0 / 120.0));
        }

        prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                timestamp: start + ChronoDuration::hours(4 * i as i64),
                price,
            })
            .collect()
    }

    fn test_asset(current_price: f64) -> Asset {
        Asset {
            id: "testcoin".into(),
            symbol: "TST".into(),
            current_price,
            market_cap: 500_000_000.0,
            volume_24h: 50_000_000.0,
        }
    }

    fn scanner_with_feed(feed: Arc<dyn DataFeed>, notifier: Arc<RecordingNotifier>) -> ScannerService {
        ScannerService::new(
            feed,
            notifier,
            Arc::new(ConfidenceEstimator::new()),
            ScreenerConfig::default(),
            new_shared_state(16),
        )
    }

    #[tokio::test]
    async fn test_cycle_detects_pattern_and_notifies() {
        let feed = Arc::new(StaticFeed {
            assets: vec![test_asset(104.0)],
            prices: double_bottom_series(),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = scanner_with_feed(feed, notifier.clone());

        let count = scanner.run_cycle().await.unwrap();
        assert_eq!(count, 1);

        let alerts = notifier.alerts.lock().await;
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        // 104 < 102 * 1.05, second bottom still forming
        assert_eq!(alert.tier, AlertTier::Yellow);
        assert_eq!(alert.confidence, 0.5);
        assert!((alert.depth - 0.02).abs() < 1e-9);
        assert!((alert.stop_loss - 102.0 * 0.95).abs() < 1e-9);

        let state = scanner.shared_state.patterns.read().await;
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].tier, Some(AlertTier::Yellow));
        assert_eq!(state[0].timespan_days, Some(30.0));
    }

    #[tokio::test]
    async fn test_cycle_is_deterministic_on_identical_input() {
        let feed = Arc::new(StaticFeed {
            assets: vec![test_asset(104.0)],
            prices: double_bottom_series(),
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = scanner_with_feed(feed, notifier.clone());

        scanner.run_cycle().await.unwrap();
        let first = scanner.shared_state.patterns.read().await.clone();
        scanner.run_cycle().await.unwrap();
        let second = scanner.shared_state.patterns.read().await.clone();

        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);

        let alerts = notifier.alerts.lock().await;
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].tier, alerts[1].tier);
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_cycle() {
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = ScannerService::new(
            Arc::new(FailingFeed),
            notifier.clone(),
            Arc::new(ConfidenceEstimator::new()),
            ScreenerConfig::default(),
            new_shared_state(16),
        );

        let result = scanner.run_cycle().await;
        assert!(matches!(result, Err(ScanError::DataFetch(_))));
        assert!(scanner.shared_state.patterns.read().await.is_empty());
        assert!(notifier.alerts.lock().await.is_empty());

        // tick() swallows the error so the next scheduled cycle proceeds
        scanner.tick().await;
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let (entered_tx, mut entered_rx) = mpsc::channel(1);
        let (release_tx, release_rx) = mpsc::channel(1);
        let feed = Arc::new(BlockingFeed {
            calls: AtomicUsize::new(0),
            entered_tx,
            release_rx: Mutex::new(release_rx),
        });

        let scanner = Arc::new(ScannerService::new(
            feed.clone(),
            Arc::new(RecordingNotifier::default()),
            Arc::new(ConfidenceEstimator::new()),
            ScreenerConfig::default(),
            new_shared_state(16),
        ));

        let first = tokio::spawn({
            let scanner = scanner.clone();
            async move { scanner.tick().await }
        });
        // Wait until the first cycle is inside the feed and holding the guard
        entered_rx.recv().await.unwrap();

        // A tick while a cycle is in flight must return without scanning
        scanner.tick().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        release_tx.send(()).await.unwrap();
        first.await.unwrap();
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        // With the guard free again the next tick scans; pre-buffer the
        // release so the cycle runs to completion inline
        release_tx.send(()).await.unwrap();
        scanner.tick().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_pattern_yields_empty_status() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rising: Vec<PricePoint> = (0..360)
            .map(|i| PricePoint {
                timestamp: start + ChronoDuration::hours(4 * i as i64),
                price: 100.0 + i as f64 * 0.1,
            })
            .collect();

        let feed = Arc::new(StaticFeed {
            assets: vec![test_asset(120.0)],
            prices: rising,
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let scanner = scanner_with_feed(feed, notifier.clone());

        scanner.run_cycle().await.unwrap();
        assert!(notifier.alerts.lock().await.is_empty());

        let state = scanner.shared_state.patterns.read().await;
        assert_eq!(state.len(), 1);
        assert!(state[0].tier.is_none());
        assert!(state[0].neckline_price.is_none());
    }
}
