use async_trait::async_trait;

use crate::models::pattern::{AlertTier, PatternAlert};

/// Alert sink. Delivery success is not the scanner's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &PatternAlert);
}

/// Renders alerts as tier-graded log lines.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, alert: &PatternAlert) {
        match alert.tier {
            AlertTier::Yellow => {
                tracing::warn!(
                    "🟡 SECOND BOTTOM FORMING on {} - price ${:.2} near second bottom, neckline ${:.2}, confidence {:.0}%, stop ${:.2}",
                    alert.symbol,
                    alert.current_price,
                    alert.neckline,
                    alert.confidence * 100.0,
                    alert.stop_loss
                );
            }
            AlertTier::Orange => {
                tracing::warn!(
                    "🟠 DOUBLE BOTTOM COMPLETED on {} - price ${:.2} below neckline ${:.2}, confidence {:.0}%, target +{:.1}%",
                    alert.symbol,
                    alert.current_price,
                    alert.neckline,
                    alert.confidence * 100.0,
                    alert.target_gain_fraction * 100.0
                );
            }
            AlertTier::Red => {
                tracing::warn!(
                    "🔴 BREAKOUT IMMINENT on {} - price ${:.2} at neckline ${:.2}, confidence {:.0}%, stop ${:.2}",
                    alert.symbol,
                    alert.current_price,
                    alert.neckline,
                    alert.confidence * 100.0,
                    alert.stop_loss
                );
            }
            AlertTier::None => {
                tracing::debug!(
                    "No tier for {} at ${:.2} (neckline ${:.2})",
                    alert.symbol,
                    alert.current_price,
                    alert.neckline
                );
            }
        }
    }
}
