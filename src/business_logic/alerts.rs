use crate::models::pattern::{AlertTier, Pattern};

/// Map current price and pattern into an alert tier.
///
/// Conditions are checked in strict priority order; the first match wins
/// even when a later condition also holds. Orange and Red are complementary
/// over finite prices, so the trailing `None` arm is kept only for
/// non-finite input.
pub fn classify(current_price: f64, pattern: &Pattern) -> AlertTier {
    if current_price < pattern.second_bottom.price * 1.05 {
        AlertTier::Yellow
    } else if current_price < pattern.neckline * 0.95 {
        AlertTier::Orange
    } else if current_price >= pattern.neckline * 0.95 {
        AlertTier::Red
    } else {
        AlertTier::None
    }
}

/// Suggested stop below the second bottom.
pub fn stop_loss(pattern: &Pattern) -> f64 {
    pattern.second_bottom.price * 0.95
}

/// Gain fraction from current price up to the neckline.
pub fn target_gain_fraction(current_price: f64, pattern: &Pattern) -> f64 {
    (pattern.neckline - current_price) / current_price
}
