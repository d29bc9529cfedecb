// src/screener/rates.rs
use crate::config::FALLBACK_USD_INR_RATE;
use crate::screener::client::ScreenerClient;
use once_cell::sync::Lazy;
use std::sync::RwLock;

// Process-wide USD→INR rate. Refreshed on demand; a pipeline run reads it once.
static USD_INR_RATE: Lazy<RwLock<Option<f64>>> = Lazy::new(|| RwLock::new(None));

fn cached_rate() -> Option<f64> {
    USD_INR_RATE.read().ok().and_then(|guard| *guard)
}

fn store_rate(rate: f64) {
    if let Ok(mut guard) = USD_INR_RATE.write() {
        *guard = Some(rate);
    }
}

/// Returns the configured override, else the cached rate, fetching it first
/// if nothing is cached yet.
pub async fn current_usd_inr_rate(client: &ScreenerClient) -> f64 {
    if let Some(rate) = client.config().rate_override {
        return rate;
    }
    if let Some(rate) = cached_rate() {
        return rate;
    }
    refresh_usd_inr_rate(client).await
}

/// Fetches a fresh rate; on any failure the fallback constant is stored instead.
pub async fn refresh_usd_inr_rate(client: &ScreenerClient) -> f64 {
    let rate = match client.fetch_usd_inr_rate().await {
        Ok(rate) => {
            tracing::info!("USD/INR rate: {}", rate);
            rate
        }
        Err(e) => {
            tracing::warn!(
                "Exchange rate unavailable ({}); using fallback {}",
                e,
                FALLBACK_USD_INR_RATE
            );
            FALLBACK_USD_INR_RATE
        }
    };
    store_rate(rate);
    rate
}
