// src/config.rs
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.screener.in";
pub const DEFAULT_RATE_URL: &str = "https://api.exchangerate.host/latest?base=USD&symbols=INR";
pub const DEFAULT_NEWS_URL: &str = "https://news-mediator.tradingview.com/news-flow/v2/news?filter=lang%3Aen_IN&filter=market%3Astock&filter=market_country%3AIN&client=screener&streaming=true";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Used whenever the exchange-rate collaborator is unavailable.
pub const FALLBACK_USD_INR_RATE: f64 = 83.0;

/// Immutable lookup tables consulted by the extractors.
///
/// Built once at startup and handed to [`crate::extractors::CompanyExtractor`];
/// nothing in the extraction code reaches for these as globals.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Site root used to absolutize relative hrefs and to synthesize raw PDF links.
    pub base_url: String,
    /// Substrings (lower-case) that mark an anchor as a credit rating document.
    pub credit_vocabulary: Vec<String>,
    /// Month abbreviation to fiscal-quarter-end numeral.
    pub quarter_months: Vec<(&'static str, &'static str)>,
    /// First-column labels (lower-case) that identify a shareholding pattern table.
    pub shareholding_labels: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl ExtractorConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credit_vocabulary: [
                "crisil",
                "care",
                "icra",
                "india ratings",
                "fitch",
                "moody",
                "s&p",
                "rating",
                "update",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            quarter_months: vec![("Mar", "03"), ("Jun", "06"), ("Sep", "09"), ("Dec", "12")],
            shareholding_labels: [
                "promoters",
                "fiis",
                "diis",
                "public",
                "others",
                "no. of shareholders",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    /// Makes a site-relative href absolute; other hrefs pass through untouched.
    pub fn absolutize(&self, href: &str) -> String {
        if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            href.to_string()
        }
    }

    /// Looks up the quarter-end month numeral for a month name ("Dec", "december", ...).
    pub fn quarter_month(&self, month: &str) -> Option<&'static str> {
        let key: String = month.chars().take(3).collect::<String>().to_lowercase();
        self.quarter_months
            .iter()
            .find(|(abbrev, _)| abbrev.to_lowercase() == key)
            .map(|(_, num)| *num)
    }
}

/// Runtime settings for the network collaborators, resolved from CLI args and env.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub rate_url: String,
    pub news_url: String,
    pub timeout: Duration,
    /// Fixed USD→INR rate; when set the rate API is never called.
    pub rate_override: Option<f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_url: DEFAULT_RATE_URL.to_string(),
            news_url: DEFAULT_NEWS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_override: None,
        }
    }
}

impl AppConfig {
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::with_base_url(&self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_month_accepts_long_and_mixed_case_names() {
        let cfg = ExtractorConfig::default();
        assert_eq!(cfg.quarter_month("Dec"), Some("12"));
        assert_eq!(cfg.quarter_month("march"), Some("03"));
        assert_eq!(cfg.quarter_month("SEP"), Some("09"));
        assert_eq!(cfg.quarter_month("Jan"), None);
    }

    #[test]
    fn absolutize_only_touches_relative_links() {
        let cfg = ExtractorConfig::with_base_url("https://example.test/");
        assert_eq!(cfg.absolutize("/a/b/"), "https://example.test/a/b/");
        assert_eq!(cfg.absolutize("https://bse.test/x.pdf"), "https://bse.test/x.pdf");
    }
}
