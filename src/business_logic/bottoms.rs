use crate::models::price::{Bottom, PricePoint};

/// Points on each side a candidate must not exceed.
const WINDOW: usize = 10;

/// Scan an ordered price series for local minima.
///
/// An index is a bottom iff its price is `<=` every price in the 10-point
/// window on each side. The non-strict comparison means a flat stretch can
/// yield several adjacent bottoms; that tie-breaking is intentional and no
/// dedup is applied, so callers must expect near-duplicate neighbors.
/// Series shorter than 21 points yield nothing.
pub fn find_bottoms(prices: &[PricePoint]) -> Vec<Bottom> {
    if prices.len() < 2 * WINDOW + 1 {
        return Vec::new();
    }

    let mut bottoms = Vec::new();
    for i in WINDOW..prices.len() - WINDOW {
        let candidate = prices[i].price;
        let is_bottom = prices[i - WINDOW..i]
            .iter()
            .chain(&prices[i + 1..=i + WINDOW])
            .all(|p| candidate <= p.price);

        if is_bottom {
            bottoms.push(Bottom {
                timestamp: prices[i].timestamp,
                price: candidate,
                index: i,
            });
        }
    }

    bottoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(prices: &[f64]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp: start + Duration::hours(4 * i as i64),
                price,
            })
            .collect()
    }

    #[test]
    fn test_clean_symmetric_minimum() {
        // V shape: strictly higher values flanking index 10 on both sides
        let mut prices: Vec<f64> = (0..10).map(|i| 110.0 - i as f64).collect();
        prices.push(100.0);
        prices.extend((1..=10).map(|i| 100.0 + i as f64));

        let bottoms = find_bottoms(&series(&prices));
        assert_eq!(bottoms.len(), 1);
        assert_eq!(bottoms[0].index, 10);
        assert_eq!(bottoms[0].price, 100.0);
    }

    #[test]
    fn test_short_series_yields_nothing() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(find_bottoms(&series(&prices)).is_empty());
    }

    #[test]
    fn test_plateau_yields_adjacent_bottoms() {
        let mut prices: Vec<f64> = (0..10).map(|i| 110.0 - i as f64).collect();
        prices.extend([100.0, 100.0, 100.0]);
        prices.extend((1..=10).map(|i| 100.0 + i as f64));

        let bottoms = find_bottoms(&series(&prices));
        let indices: Vec<usize> = bottoms.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![10, 11, 12]);
    }

    #[test]
    fn test_output_preserves_input_order() {
        let mut prices: Vec<f64> = Vec::new();
        prices.extend((0..12).map(|i| 115.0 - i as f64)); // down to 104
        prices.extend((1..=15).map(|i| 104.0 + i as f64 * 0.5)); // up
        prices.extend((1..=15).map(|i| 111.5 - i as f64 * 0.4)); // down to 105.5
        prices.extend((1..=12).map(|i| 105.5 + i as f64)); // up

        let bottoms = find_bottoms(&series(&prices));
        assert!(bottoms.len() >= 2);
        assert!(bottoms.windows(2).all(|w| w[0].index < w[1].index));
    }
}
