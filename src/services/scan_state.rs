use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::pattern::{AssetPatternStatus, ScanSnapshot};

#[derive(Debug)]
pub struct ScanStateInner {
    pub patterns: RwLock<Vec<AssetPatternStatus>>,
    pub broadcaster: broadcast::Sender<ScanSnapshot>,
}

pub type SharedScanState = Arc<ScanStateInner>;

pub fn new_shared_state(capacity: usize) -> SharedScanState {
    let (broadcaster, _receiver) = broadcast::channel(capacity);
    Arc::new(ScanStateInner {
        patterns: RwLock::new(Vec::new()),
        broadcaster,
    })
}
