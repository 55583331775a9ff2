pub mod prediction;
pub mod stock;
pub mod user;
