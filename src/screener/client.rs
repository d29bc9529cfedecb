// src/screener/client.rs
use crate::config::AppConfig;
use crate::extractors::peers::PeerApi;
use crate::screener::models::{
    company_page_url, peers_api_url, ExchangeRateResponse, NewsFeed, PeerApiResponse,
    RawDocument, Variant,
};
use crate::utils::error::ScreenerError;
use async_trait::async_trait;
use reqwest::header;

// The site serves a reduced page (and the news feed refuses) without a browser-like agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Thin blocking-style wrapper (one awaited call at a time) over the remote collaborators.
#[derive(Debug, Clone)]
pub struct ScreenerClient {
    http: reqwest::Client,
    config: AppConfig,
}

/// Creates a reqwest client configured for Screener interaction.
fn build_screener_client(config: &AppConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(config.timeout) // Bounded: a slow collaborator degrades, never hangs
        .build()
}

impl ScreenerClient {
    pub fn new(config: AppConfig) -> Result<Self, ScreenerError> {
        let http = build_screener_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Issues a GET and maps any non-2xx status to an error.
    async fn get_checked(&self, url: &str, accept: &str) -> Result<reqwest::Response, ScreenerError> {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await?; // Propagates reqwest::Error as ScreenerError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScreenerError::PageNotFound(url.to_string()));
            }
            return Err(ScreenerError::Http(status));
        }
        Ok(response)
    }

    /// Downloads the company page for a symbol and variant.
    pub async fn fetch_company_page(
        &self,
        symbol: &str,
        variant: Variant,
    ) -> Result<RawDocument, ScreenerError> {
        let url = company_page_url(&self.config.base_url, symbol, variant);
        tracing::info!("Downloading company page from: {}", url);

        let response = self
            .get_checked(&url, "text/html,application/xhtml+xml,*/*;q=0.8")
            .await?;
        let body = response.text().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

        Ok(RawDocument::new(symbol, variant, body))
    }

    /// Fetches the latest USD→INR rate.
    pub async fn fetch_usd_inr_rate(&self) -> Result<f64, ScreenerError> {
        let response = self
            .get_checked(&self.config.rate_url, "application/json")
            .await?;
        let body: ExchangeRateResponse = response.json().await?;
        body.rates
            .get("INR")
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| ScreenerError::Parse("response carries no INR rate".to_string()))
    }

    /// Fetches the headline feed once.
    pub async fn fetch_news(&self) -> Result<NewsFeed, ScreenerError> {
        let response = self
            .get_checked(&self.config.news_url, "application/json, text/plain, */*")
            .await?;
        let feed: NewsFeed = response.json().await?;
        tracing::info!("Fetched {} headlines", feed.items.len());
        Ok(feed)
    }
}

#[async_trait]
impl PeerApi for ScreenerClient {
    async fn fetch_peers(&self, company_id: &str) -> Result<Vec<serde_json::Value>, ScreenerError> {
        let url = peers_api_url(&self.config.base_url, company_id);
        tracing::info!("Calling peer API: {}", url);

        let response = self.get_checked(&url, "application/json").await?;
        let body: PeerApiResponse = response
            .json()
            .await
            .map_err(|e| ScreenerError::Parse(format!("peer API body: {}", e)))?;

        if body.peers.is_empty() {
            return Err(ScreenerError::EmptyPayload(format!(
                "no peers for company {}",
                company_id
            )));
        }
        tracing::debug!("Peer API returned {} rows", body.peers.len());
        Ok(body.peers)
    }
}
