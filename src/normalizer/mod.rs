// src/normalizer/mod.rs
pub mod currency;
pub mod headlines;

pub use currency::CurrencyNormalizer;
