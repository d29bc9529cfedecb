// src/screener/mod.rs
pub mod client;
pub mod models;
pub mod rates;

pub use client::ScreenerClient;
pub use models::Variant;
