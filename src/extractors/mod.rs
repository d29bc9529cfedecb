// src/extractors/mod.rs
pub mod concalls;
pub mod links;
pub mod peers;
pub mod raw_pdf;
pub mod tables;
pub mod text;
pub mod tree;

use crate::config::ExtractorConfig;
use crate::screener::models::RawDocument;
use scraper::Html;

use self::links::CategorizedLinks;
use self::peers::PeerTable;
use self::tables::{ShareholdingPattern, TableSet};
use self::text::TextBlock;

/// Outcome of a single extraction attempt. Failures carry a reason for
/// diagnostics and never cross a component boundary as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Found(T),
    Empty,
    Failed(String),
}

impl<T> Extraction<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }
}

/// Everything pulled out of one company page. Owns its data; the parse tree
/// is gone by the time this is returned.
#[derive(Debug, Clone)]
pub struct PageExtraction {
    pub tables: TableSet,
    pub links: CategorizedLinks,
    pub text_blocks: Vec<TextBlock>,
    pub shareholding: Option<ShareholdingPattern>,
    /// Hrefs from the page's own "Raw PDF" row, per quarterly column.
    pub raw_pdf_links: Vec<Option<String>>,
    /// `data-company-id` found in the markup, if any.
    pub page_company_id: Option<String>,
    /// In-page peer table, consulted only when the peer API yields nothing.
    pub peer_fallback: Extraction<PeerTable>,
}

pub struct CompanyExtractor {
    config: ExtractorConfig,
}

impl CompanyExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Runs every tree-based extractor over one parse of the page.
    pub fn extract(&self, doc: &RawDocument) -> PageExtraction {
        tracing::info!(
            "Extracting {} ({}) from {} bytes fetched at {}",
            doc.symbol,
            doc.variant,
            doc.html.len(),
            doc.fetched_at.to_rfc3339()
        );
        let document = Html::parse_document(&doc.html);
        let root = document.root_element();

        PageExtraction {
            tables: tables::extract_tables(root),
            links: links::categorize_links(root, &self.config),
            text_blocks: text::extract_text_blocks(root),
            shareholding: tables::extract_shareholding(root, &self.config),
            raw_pdf_links: raw_pdf::extract_raw_pdf_links(root),
            page_company_id: peers::page_company_id(root),
            peer_fallback: peers::extract_html_peers(root, &self.config),
        }
    }
}
