// src/pipeline.rs
use crate::extractors::links::CategorizedLinks;
use crate::extractors::peers::{self, PeerApi, PeerResolution};
use crate::extractors::raw_pdf;
use crate::extractors::tables::{ExtractedTable, ShareholdingPattern};
use crate::extractors::text::TextBlock;
use crate::extractors::CompanyExtractor;
use crate::screener::models::{RawDocument, Variant};
use crate::storage::CompanyIdTable;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything surfaced for one company page.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub symbol: String,
    pub variant: Variant,
    pub fetched_at: DateTime<Utc>,
    pub company_id: Option<String>,
    pub tables: Vec<ExtractedTable>,
    /// Reasons tables were dropped; not part of the data.
    pub table_failures: Vec<String>,
    pub links: CategorizedLinks,
    pub text_blocks: Vec<TextBlock>,
    pub shareholding: Option<ShareholdingPattern>,
    pub peers: PeerResolution,
}

/// Lookup table first, then the id embedded in the page.
pub fn resolve_company_id(
    ids: &CompanyIdTable,
    symbol: &str,
    variant: Variant,
    page_company_id: Option<&str>,
) -> Option<String> {
    if let Some(id) = ids.lookup(symbol, variant) {
        tracing::debug!("Company id {} for {} from lookup table", id, symbol);
        return Some(id);
    }
    let id = page_company_id.map(str::to_string);
    match &id {
        Some(id) => tracing::debug!("Company id {} for {} from page markup", id, symbol),
        None => tracing::warn!("No company id for {} ({})", symbol, variant),
    }
    id
}

/// Extracts the page, attaches the raw PDF row and resolves peers.
pub async fn build_report<A: PeerApi + ?Sized>(
    doc: &RawDocument,
    extractor: &CompanyExtractor,
    ids: &CompanyIdTable,
    api: &A,
) -> CompanyReport {
    let mut page = extractor.extract(doc);
    let config = extractor.config();
    let company_id = resolve_company_id(ids, &doc.symbol, doc.variant, page.page_company_id.as_deref());

    raw_pdf::attach_to_quarterly(
        &mut page.tables,
        &page.raw_pdf_links,
        company_id.as_deref(),
        config,
    );

    tracing::debug!(
        "Page peer table present: {}; concalls with links: {} of {}",
        page.peer_fallback.is_found(),
        page.links.concalls.iter().filter(|c| c.has_links()).count(),
        page.links.concalls.len()
    );
    let peers = peers::resolve_peers(api, company_id.as_deref(), page.peer_fallback, config).await;

    let tables: Vec<ExtractedTable> = page.tables.surfaced().into_iter().cloned().collect();
    tracing::info!(
        "Report for {}: {} tables, {} text blocks, links empty: {}",
        doc.symbol,
        tables.len(),
        page.text_blocks.len(),
        page.links.is_empty()
    );

    CompanyReport {
        symbol: doc.symbol.clone(),
        variant: doc.variant,
        fetched_at: doc.fetched_at,
        company_id,
        tables,
        table_failures: page.tables.failures,
        links: page.links,
        text_blocks: page.text_blocks,
        shareholding: page.shareholding,
        peers,
    }
}
