pub mod datafeed;
pub mod notifier;
pub mod scan_state;
pub mod scanner;
