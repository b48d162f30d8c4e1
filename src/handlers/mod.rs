pub mod double_bottom;
pub mod health;
