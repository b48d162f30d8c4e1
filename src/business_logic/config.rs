/// How the pattern validator pairs detected bottoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPolicy {
    /// Only the two most recently detected bottoms are considered,
    /// even if an earlier pair would match better.
    MostRecent,
    /// Pick the lowest-depth pair among all pairs with valid spacing.
    BestMatch,
}

/// Configuration parameters for double bottom screening
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Min 24h volume (USD) for an asset to be screened
    pub min_volume_usd: f64,
    /// Min market capitalization (USD) for an asset to be screened
    pub min_market_cap_usd: f64,
    /// Max relative price difference between the two bottoms
    pub tolerance_fraction: f64,
    /// Min days between the two bottoms
    pub min_spacing_days: f64,
    /// Max days between the two bottoms
    pub max_spacing_days: f64,
    /// Days of price history to fetch per asset
    pub history_window_days: u32,
    /// Sampling interval of the price history, in hours
    pub interval_hours: u32,
    /// Minutes between scan cycles
    pub cycle_minutes: u64,
    /// Bottom pairing strategy
    pub pairing: PairingPolicy,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_volume_usd: 10_000_000.0,
            min_market_cap_usd: 100_000_000.0,
            tolerance_fraction: 0.20,
            min_spacing_days: 21.0,
            max_spacing_days: 42.0,
            // 60 days at 4h covers two bottoms up to 42 days apart with margin
            history_window_days: 60,
            interval_hours: 4,
            cycle_minutes: 30,
            pairing: PairingPolicy::MostRecent,
        }
    }
}

impl ScreenerConfig {
    /// Defaults with optional `SCREENER_*` environment overrides.
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = parsed_env::<f64>("SCREENER_MIN_VOLUME_USD") {
            config.min_volume_usd = v;
        }
        if let Some(v) = parsed_env::<f64>("SCREENER_MIN_MARKET_CAP_USD") {
            config.min_market_cap_usd = v;
        }
        if let Some(v) = parsed_env::<f64>("SCREENER_TOLERANCE_FRACTION") {
            config.tolerance_fraction = v;
        }
        if let Some(v) = parsed_env::<f64>("SCREENER_MIN_SPACING_DAYS") {
            config.min_spacing_days = v;
        }
        if let Some(v) = parsed_env::<f64>("SCREENER_MAX_SPACING_DAYS") {
            config.max_spacing_days = v;
        }
        if let Some(v) = parsed_env::<u32>("SCREENER_HISTORY_WINDOW_DAYS") {
            config.history_window_days = v;
        }
        if let Some(v) = parsed_env::<u32>("SCREENER_INTERVAL_HOURS") {
            config.interval_hours = v;
        }
        if let Some(v) = parsed_env::<u64>("SCREENER_CYCLE_MINUTES") {
            // A zero period would panic when the scanner builds its interval
            if v == 0 {
                tracing::warn!("SCREENER_CYCLE_MINUTES must be at least 1, keeping default");
            } else {
                config.cycle_minutes = v;
            }
        }
        if let Ok(v) = std::env::var("SCREENER_PAIRING") {
            match v.to_lowercase().as_str() {
                "most_recent" => config.pairing = PairingPolicy::MostRecent,
                "best_match" => config.pairing = PairingPolicy::BestMatch,
                other => tracing::warn!("Unknown SCREENER_PAIRING '{}', keeping default", other),
            }
        }

        config
    }
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
