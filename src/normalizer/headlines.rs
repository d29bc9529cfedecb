// src/normalizer/headlines.rs
use crate::normalizer::currency::CurrencyNormalizer;
use crate::screener::models::NewsItem;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

pub const STORY_BASE_URL: &str = "https://in.tradingview.com";

// UTC+05:30
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub id: String,
    pub title: String,
    pub provider: Option<String>,
    pub published: Option<String>,
    pub story_url: Option<String>,
    pub urgency: Option<String>,
    pub symbols: Vec<String>,
}

/// Epoch seconds rendered as "30-04-2024 03:04 PM IST".
pub fn format_ist(epoch_secs: i64) -> Option<String> {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS)?;
    let utc = DateTime::from_timestamp(epoch_secs, 0)?;
    Some(utc.with_timezone(&ist).format("%d-%m-%Y %I:%M %p IST").to_string())
}

// Zero, false, null and empty values count as "no urgency".
fn urgency_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn matches_query(headline: &Headline, query: &str) -> bool {
    let query = query.to_lowercase();
    headline.title.to_lowercase().contains(&query)
        || headline
            .symbols
            .iter()
            .any(|s| s.to_lowercase().contains(&query))
}

/// Builds the headline view: items without an id or title are dropped, titles
/// pass through the currency normalizer, and an optional query filters by
/// title or related symbol.
pub fn build_headlines(
    items: &[NewsItem],
    normalizer: &CurrencyNormalizer,
    query: Option<&str>,
) -> Vec<Headline> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let headlines: Vec<Headline> = items
        .iter()
        .filter(|item| !item.id.trim().is_empty() && !item.title.trim().is_empty())
        .map(|item| Headline {
            id: item.id.clone(),
            title: normalizer.normalize(item.title.trim()),
            provider: item.provider.as_ref().and_then(|p| p.name.clone()),
            published: item.published.and_then(format_ist),
            story_url: item
                .story_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}", STORY_BASE_URL, p)),
            urgency: urgency_label(item.urgency.as_ref()),
            symbols: item
                .related_symbols
                .iter()
                .map(|s| s.symbol.clone())
                .filter(|s| !s.is_empty())
                .collect(),
        })
        .filter(|h| query.map_or(true, |q| matches_query(h, q)))
        .collect();
    tracing::info!(
        "{} of {} news items kept{}",
        headlines.len(),
        items.len(),
        query.map(|q| format!(" for '{}'", q)).unwrap_or_default()
    );
    headlines
}
