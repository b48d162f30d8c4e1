use std::sync::Arc;

use crate::business_logic::confidence::ConfidenceEstimator;
use crate::services::scan_state::SharedScanState;

#[derive(Clone)]
pub struct AppState {
    pub scan_state: SharedScanState,
    pub estimator: Arc<ConfidenceEstimator>,
}
