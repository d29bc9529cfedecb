// src/extractors/tables.rs
use crate::config::ExtractorConfig;
use crate::extractors::tree::HtmlNode;
use crate::extractors::Extraction;
use crate::utils::error::ExtractError;
use serde::Serialize;
use std::collections::HashSet;

const OTHER_TABLE_TITLE: &str = "Other Table";
const SECTION_FALLBACK_TITLE: &str = "Section";
// Upper bound on colspan expansion; anything above is a layout table.
const MAX_COLSPAN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedTable {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Fewer than two data rows or two columns: a layout artifact, not data.
    pub fn is_degenerate(&self) -> bool {
        self.row_count() < 2 || self.column_count() < 2
    }

    fn title_contains(&self, needle: &str) -> bool {
        self.title
            .as_deref()
            .map(|t| t.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    pub fn is_peer_table(&self) -> bool {
        self.title_contains("peer") || self.title_contains("comparison")
    }

    pub fn is_quarterly(&self) -> bool {
        self.title_contains("quarter")
    }
}

/// Every accepted table in document order plus why the rest were dropped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableSet {
    pub tables: Vec<ExtractedTable>,
    pub failures: Vec<String>,
}

impl TableSet {
    /// The default view: first table per title wins, peer tables are left to
    /// the peer resolver.
    pub fn surfaced(&self) -> Vec<&ExtractedTable> {
        let mut seen: HashSet<Option<&str>> = HashSet::new();
        self.tables
            .iter()
            .filter(|t| !t.is_peer_table())
            .filter(|t| seen.insert(t.title.as_deref()))
            .collect()
    }

    pub fn quarterly_mut(&mut self) -> Option<&mut ExtractedTable> {
        self.tables.iter_mut().find(|t| t.is_quarterly())
    }
}

fn cell_span<N: HtmlNode>(cell: N) -> usize {
    cell.attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_COLSPAN)
}

fn row_cells<N: HtmlNode>(row: N) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in row.children_by_tag(&["td", "th"]) {
        let text = cell.text_content();
        for _ in 0..cell_span(cell) {
            cells.push(text.clone());
        }
    }
    cells
}

/// Structural conversion of a `<table>` element: header from `<thead>` or a
/// leading all-`<th>` row, data from every other row, ragged rows padded.
pub fn convert_table<N: HtmlNode>(table: N) -> Result<ExtractedTable, ExtractError> {
    let rows = table.descendants_by_tag(&["tr"]);
    if rows.is_empty() {
        return Err(ExtractError::NoRows);
    }

    let mut header_idx = rows.iter().position(|tr| tr.has_ancestor("thead"));
    if header_idx.is_none() {
        let first = rows[0];
        let all_th = !first.children_by_tag(&["th"]).is_empty()
            && first.children_by_tag(&["td"]).is_empty();
        if all_th {
            header_idx = Some(0);
        }
    }

    let mut headers = header_idx.map(|i| row_cells(rows[i])).unwrap_or_default();
    let mut data: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .filter(|(i, tr)| Some(*i) != header_idx && !tr.has_ancestor("thead"))
        .map(|(_, tr)| row_cells(*tr))
        .filter(|cells| !cells.is_empty())
        .collect();

    let width = data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if width == 0 {
        return Err(ExtractError::NoCells);
    }

    // Unnamed columns are numbered, the way a dataframe would label them.
    for i in headers.len()..width {
        headers.push(i.to_string());
    }
    for row in data.iter_mut() {
        row.resize(width, String::new());
    }

    Ok(ExtractedTable {
        title: None,
        headers,
        rows: data,
    })
}

/// Converts and shape-checks one table.
pub fn extract_table<N: HtmlNode>(table: N, title: &str) -> Extraction<ExtractedTable> {
    match convert_table(table) {
        Ok(mut t) => {
            t.title = Some(title.to_string());
            if t.is_degenerate() {
                tracing::debug!(
                    "Dropping degenerate table '{}' ({}x{})",
                    title,
                    t.row_count(),
                    t.column_count()
                );
                Extraction::Empty
            } else {
                Extraction::Found(t)
            }
        }
        Err(e) => Extraction::Failed(format!("{}: {}", title, e)),
    }
}

/// Title for tables inside a section: heading text, else the id, else "Section".
pub fn section_title<N: HtmlNode>(section: N) -> String {
    section
        .first_descendant(&["h2"])
        .map(|h2| h2.text_content())
        .filter(|t| !t.is_empty())
        .or_else(|| section.attr("id").map(str::to_string))
        .unwrap_or_else(|| SECTION_FALLBACK_TITLE.to_string())
}

pub fn extract_tables<N: HtmlNode>(root: N) -> TableSet {
    let mut set = TableSet::default();
    let mut push = |extraction: Extraction<ExtractedTable>| match extraction {
        Extraction::Found(t) => set.tables.push(t),
        Extraction::Empty => {}
        Extraction::Failed(reason) => {
            tracing::debug!("Skipping table: {}", reason);
            set.failures.push(reason);
        }
    };

    for section in root.descendants_by_tag(&["section"]) {
        let title = section_title(section);
        for table in section.descendants_by_tag(&["table"]) {
            push(extract_table(table, &title));
        }
    }
    for table in root.descendants_by_tag(&["table"]) {
        if !table.has_ancestor("section") {
            push(extract_table(table, OTHER_TABLE_TITLE));
        }
    }

    tracing::info!(
        "Extracted {} tables ({} failed conversion)",
        set.tables.len(),
        set.failures.len()
    );
    set
}

/// Quarterly and yearly shareholding pattern tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareholdingPattern {
    pub quarterly: ExtractedTable,
    pub yearly: ExtractedTable,
}

/// Picks out `table.data-table` tables whose first column lists holder
/// categories; the first is quarterly, the second yearly. Both must exist.
pub fn extract_shareholding<N: HtmlNode>(
    root: N,
    config: &ExtractorConfig,
) -> Option<ShareholdingPattern> {
    let mut found = root
        .descendants_by_tag(&["table"])
        .into_iter()
        .filter(|t| t.has_class("data-table"))
        .filter_map(|t| convert_table(t).ok())
        .filter(|t| {
            t.rows.iter().any(|row| {
                let label = row.first().map(|c| c.to_lowercase()).unwrap_or_default();
                // Screener suffixes expandable rows with " +".
                let label = label.trim_end_matches('+').trim();
                config.shareholding_labels.iter().any(|l| l == label)
            })
        });

    let mut quarterly = found.next()?;
    let mut yearly = found.next()?;
    quarterly.title = Some("Quarterly Shareholding Pattern".to_string());
    yearly.title = Some("Yearly Shareholding Pattern".to_string());
    Some(ShareholdingPattern { quarterly, yearly })
}
