pub mod alerts;
pub mod bottoms;
pub mod confidence;
pub mod config;
pub mod double_bottom;
