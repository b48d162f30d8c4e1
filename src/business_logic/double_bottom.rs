use crate::business_logic::config::{PairingPolicy, ScreenerConfig};
use crate::errors::ScanError;
use crate::models::pattern::Pattern;
use crate::models::price::{Bottom, PricePoint};

/// Resistance level between two bottoms: the highest price over
/// `[first.index, second.index)`. For ordered bottoms the span always
/// contains at least the first bottom itself; should it ever be empty the
/// higher of the two bottom prices is used.
pub fn neckline(prices: &[PricePoint], first: &Bottom, second: &Bottom) -> f64 {
    let span = prices.get(first.index..second.index).unwrap_or(&[]);
    if span.is_empty() {
        first.price.max(second.price)
    } else {
        span.iter().map(|p| p.price).fold(f64::MIN, f64::max)
    }
}

/// Pairs detected bottoms and checks them against the tolerance and
/// spacing constraints.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    tolerance_fraction: f64,
    min_spacing_days: f64,
    max_spacing_days: f64,
    pairing: PairingPolicy,
}

impl PatternValidator {
    pub fn new(config: &ScreenerConfig) -> Self {
        Self {
            tolerance_fraction: config.tolerance_fraction,
            min_spacing_days: config.min_spacing_days,
            max_spacing_days: config.max_spacing_days,
            pairing: config.pairing,
        }
    }

    /// Validate the detected bottoms into a double bottom, or `None` if no
    /// pair satisfies the constraints. Fewer than two bottoms never match.
    pub fn validate(
        &self,
        prices: &[PricePoint],
        bottoms: &[Bottom],
    ) -> Result<Option<Pattern>, ScanError> {
        if bottoms.len() < 2 {
            return Ok(None);
        }

        match self.pairing {
            PairingPolicy::MostRecent => {
                let first = &bottoms[bottoms.len() - 2];
                let second = &bottoms[bottoms.len() - 1];
                self.check_pair(prices, first, second)
            }
            PairingPolicy::BestMatch => {
                let mut best: Option<Pattern> = None;
                for i in 0..bottoms.len() {
                    for j in i + 1..bottoms.len() {
                        if let Some(pattern) =
                            self.check_pair(prices, &bottoms[i], &bottoms[j])?
                        {
                            let tighter = best
                                .as_ref()
                                .map(|b| pattern.depth < b.depth)
                                .unwrap_or(true);
                            if tighter {
                                best = Some(pattern);
                            }
                        }
                    }
                }
                Ok(best)
            }
        }
    }

    fn check_pair(
        &self,
        prices: &[PricePoint],
        first: &Bottom,
        second: &Bottom,
    ) -> Result<Option<Pattern>, ScanError> {
        if first.price <= 0.0 {
            return Err(ScanError::Computation(format!(
                "non-positive bottom price {} at index {}",
                first.price, first.index
            )));
        }

        let depth = (first.price - second.price).abs() / first.price;
        let timespan_days =
            (second.timestamp - first.timestamp).num_seconds() as f64 / 86_400.0;

        if depth > self.tolerance_fraction {
            tracing::debug!(
                "Pair rejected: depth {:.4} above tolerance {:.4}",
                depth,
                self.tolerance_fraction
            );
            return Ok(None);
        }
        if timespan_days < self.min_spacing_days || timespan_days > self.max_spacing_days {
            tracing::debug!(
                "Pair rejected: spacing {:.1}d outside [{:.0}, {:.0}]",
                timespan_days,
                self.min_spacing_days,
                self.max_spacing_days
            );
            return Ok(None);
        }

        Ok(Some(Pattern {
            first_bottom: *first,
            second_bottom: *second,
            neckline: neckline(prices, first, second),
            depth,
            timespan_days,
        }))
    }
}
