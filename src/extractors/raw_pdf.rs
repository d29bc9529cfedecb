// src/extractors/raw_pdf.rs
use crate::config::ExtractorConfig;
use crate::extractors::tables::{ExtractedTable, TableSet};
use crate::extractors::tree::HtmlNode;
use once_cell::sync::Lazy;
use regex::Regex;

pub const RAW_PDF_LABEL: &str = "Raw PDF";

// "Dec 2022", "December, 2022"
static COLUMN_PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)[^\d]*(\d{4})").expect("Failed to compile COLUMN_PERIOD_RE")
});

/// Hrefs of the page's own "Raw PDF" row, one slot per data column.
/// Only directory-style links (ending in `/`) are kept.
pub fn extract_raw_pdf_links<N: HtmlNode>(root: N) -> Vec<Option<String>> {
    let row = root.descendants_by_tag(&["tr"]).into_iter().find(|tr| {
        tr.children_by_tag(&["td"])
            .iter()
            .any(|td| td.text_content().to_lowercase().contains("raw pdf"))
    });
    let Some(row) = row else {
        return Vec::new();
    };

    row.children_by_tag(&["td"])
        .into_iter()
        .skip(1)
        .map(|td| {
            td.descendants_by_tag(&["a"])
                .into_iter()
                .filter_map(|a| a.attr("href").map(str::to_string))
                .find(|href| href.ends_with('/'))
        })
        .collect()
}

/// Canonical quarterly filing URL for a column header such as "Dec 2022".
/// Requires a known company id and a quarter-end month.
pub fn synthesize_quarter_url(
    header: &str,
    company_id: Option<&str>,
    config: &ExtractorConfig,
) -> Option<String> {
    let company_id = company_id?;
    let caps = COLUMN_PERIOD_RE.captures(header.trim())?;
    let month = config.quarter_month(&caps[1])?;
    Some(format!(
        "{}/company/source/quarter/{}/{}/{}",
        config.base_url, company_id, month, &caps[2]
    ))
}

/// Replaces any existing "Raw PDF" row with one built from captured hrefs,
/// falling back to synthesized URLs, and returns the new row's link cells.
pub fn attach_raw_pdf_row(
    table: &mut ExtractedTable,
    captured: &[Option<String>],
    company_id: Option<&str>,
    config: &ExtractorConfig,
) -> Vec<Option<String>> {
    table
        .rows
        .retain(|row| row.first().map(String::as_str) != Some(RAW_PDF_LABEL));

    let links: Vec<Option<String>> = table
        .headers
        .iter()
        .skip(1)
        .enumerate()
        .map(|(col_idx, header)| {
            if let Some(Some(href)) = captured.get(col_idx) {
                tracing::debug!("Column {}: using extracted raw PDF link {}", header, href);
                return Some(config.absolutize(href));
            }
            let url = synthesize_quarter_url(header, company_id, config);
            match &url {
                Some(u) => tracing::debug!("Column {}: synthesized {}", header, u),
                None => tracing::debug!("Column {}: no raw PDF link", header),
            }
            url
        })
        .collect();

    let mut row = Vec::with_capacity(table.column_count());
    row.push(RAW_PDF_LABEL.to_string());
    row.extend(links.iter().map(|l| l.clone().unwrap_or_default()));
    row.resize(table.column_count().max(1), String::new());
    table.rows.push(row);
    links
}

/// Applies [`attach_raw_pdf_row`] to the first table whose title mentions "quarter".
pub fn attach_to_quarterly(
    tables: &mut TableSet,
    captured: &[Option<String>],
    company_id: Option<&str>,
    config: &ExtractorConfig,
) -> bool {
    match tables.quarterly_mut() {
        Some(table) => {
            let links = attach_raw_pdf_row(table, captured, company_id, config);
            tracing::info!(
                "Attached raw PDF row ({} of {} columns linked)",
                links.iter().filter(|l| l.is_some()).count(),
                links.len()
            );
            true
        }
        None => {
            tracing::debug!("No quarterly table; skipping raw PDF synthesis");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::tables::extract_tables;
    use scraper::Html;

    fn quarterly(headers: &[&str]) -> ExtractedTable {
        ExtractedTable {
            title: Some("Quarterly Results".to_string()),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: vec![
                vec!["Sales".to_string(); headers.len()],
                vec![RAW_PDF_LABEL.to_string(); headers.len()],
                vec!["Net Profit".to_string(); headers.len()],
            ],
        }
    }

    #[test]
    fn synthesizes_url_from_header_and_company_id() {
        let cfg = ExtractorConfig::default();
        let mut table = quarterly(&["", "Dec 2022"]);
        let links = attach_raw_pdf_row(&mut table, &[], Some("500"), &cfg);
        assert_eq!(
            links,
            vec![Some("https://www.screener.in/company/source/quarter/500/12/2022".to_string())]
        );
        assert!(links[0].as_deref().unwrap().ends_with("/source/quarter/500/12/2022"));
    }

    #[test]
    fn replaces_existing_row_exactly_once() {
        let cfg = ExtractorConfig::default();
        let mut table = quarterly(&["", "Sep 2022", "Dec 2022"]);
        attach_raw_pdf_row(&mut table, &[], Some("7"), &cfg);
        attach_raw_pdf_row(&mut table, &[], Some("7"), &cfg);
        let raw_rows: Vec<_> = table.rows.iter().filter(|r| r[0] == RAW_PDF_LABEL).collect();
        assert_eq!(raw_rows.len(), 1);
        assert_eq!(table.rows.last().unwrap()[0], RAW_PDF_LABEL);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn captured_links_win_and_gaps_stay_empty_without_an_id() {
        let cfg = ExtractorConfig::default();
        let mut table = quarterly(&["", "Jun 2023", "Aug 2023", "Sep 2023"]);
        let captured = vec![Some("/company/source/quarter/9/6/2023/".to_string()), None, None];
        let links = attach_raw_pdf_row(&mut table, &captured, None, &cfg);
        assert_eq!(
            links,
            vec![Some("https://www.screener.in/company/source/quarter/9/6/2023/".to_string()), None, None]
        );
        let row = table.rows.last().unwrap();
        assert_eq!(row.len(), 4);
        assert_eq!(row[2], "");
    }

    #[test]
    fn non_quarter_months_are_not_synthesized() {
        let cfg = ExtractorConfig::default();
        assert_eq!(synthesize_quarter_url("Aug 2023", Some("1"), &cfg), None);
        assert_eq!(synthesize_quarter_url("TTM", Some("1"), &cfg), None);
    }

    #[test]
    fn end_to_end_over_a_quarterly_section() {
        let doc = Html::parse_document(
            r#"<body><section id="quarters"><h2>Quarterly Results</h2>
            <table class="data-table">
              <thead><tr><th></th><th>Sep 2023</th><th>Dec 2023</th></tr></thead>
              <tbody>
                <tr><td>Sales +</td><td>10</td><td>11</td></tr>
                <tr><td>Net Profit</td><td>1</td><td>2</td></tr>
                <tr><td class="text">Raw PDF</td>
                    <td><a href="/company/source/quarter/55/9/2023/" target="_blank"><i class="icon-file-pdf"></i></a></td>
                    <td></td></tr>
              </tbody>
            </table></section></body>"#,
        );
        let root = doc.root_element();
        let captured = extract_raw_pdf_links(root);
        assert_eq!(captured, vec![Some("/company/source/quarter/55/9/2023/".to_string()), None]);

        let mut tables = extract_tables(root);
        let cfg = ExtractorConfig::default();
        assert!(attach_to_quarterly(&mut tables, &captured, Some("55"), &cfg));
        let table = &tables.tables[0];
        assert_eq!(
            table.rows.last().unwrap(),
            &vec![
                RAW_PDF_LABEL.to_string(),
                "https://www.screener.in/company/source/quarter/55/9/2023/".to_string(),
                "https://www.screener.in/company/source/quarter/55/12/2023".to_string(),
            ]
        );
        assert_eq!(table.rows.iter().filter(|r| r[0] == RAW_PDF_LABEL).count(), 1);
    }
}
