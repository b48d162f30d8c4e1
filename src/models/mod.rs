pub mod health;
pub mod pattern;
pub mod price;
