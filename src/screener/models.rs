// src/screener/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which flavour of the financial statements a company page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Standalone,
    Consolidated,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standalone => write!(f, "standalone"),
            Variant::Consolidated => write!(f, "consolidated"),
        }
    }
}

/// A company page as fetched; dropped once it has been parsed.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub symbol: String,
    pub variant: Variant,
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(symbol: &str, variant: Variant, html: String) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            variant,
            html,
            fetched_at: Utc::now(),
        }
    }
}

/// Constructs the public page URL for a symbol.
/// Example: https://www.screener.in/company/RELIANCE/consolidated/
pub fn company_page_url(base_url: &str, symbol: &str, variant: Variant) -> String {
    let mut url = format!("{}/company/{}/", base_url, symbol.trim().to_uppercase());
    if variant == Variant::Consolidated {
        url.push_str("consolidated/");
    }
    url
}

pub fn peers_api_url(base_url: &str, company_id: &str) -> String {
    format!("{}/api/company/{}/peers/", base_url, company_id)
}

/// Body of the peer comparison API. Anything other than a non-empty `peers`
/// list counts as a miss.
#[derive(Debug, Deserialize, Default)]
pub struct PeerApiResponse {
    #[serde(default)]
    pub peers: Vec<serde_json::Value>,
}

/// Example: {"rates": {"INR": 83.12}}
#[derive(Debug, Deserialize)]
pub struct ExchangeRateResponse {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsFeed {
    #[serde(default)]
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Epoch seconds (UTC).
    pub published: Option<i64>,
    pub provider: Option<NewsProvider>,
    #[serde(default)]
    pub related_symbols: Vec<RelatedSymbol>,
    pub story_path: Option<String>,
    pub urgency: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsProvider {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedSymbol {
    #[serde(default)]
    pub symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_consolidated_segment() {
        assert_eq!(
            company_page_url("https://www.screener.in", " tcs", Variant::Standalone),
            "https://www.screener.in/company/TCS/"
        );
        assert_eq!(
            company_page_url("https://www.screener.in", "TCS", Variant::Consolidated),
            "https://www.screener.in/company/TCS/consolidated/"
        );
    }

    #[test]
    fn news_items_tolerate_missing_fields() {
        let json = r#"{"items":[{"id":"x1","title":"Hello","published":1714469640,
            "relatedSymbols":[{"symbol":"NSE:TCS"}],"storyPath":"/news/x1"},{"id":"x2"}]}"#;
        let feed: NewsFeed = serde_json::from_str(json).unwrap();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].related_symbols[0].symbol, "NSE:TCS");
        assert!(feed.items[1].title.is_empty());
    }

    #[test]
    fn peer_response_defaults_to_empty_list() {
        let parsed: PeerApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.peers.is_empty());
    }
}
