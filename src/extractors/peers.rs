// src/extractors/peers.rs
use crate::config::ExtractorConfig;
use crate::extractors::tree::HtmlNode;
use crate::extractors::Extraction;
use crate::utils::error::{ExtractError, ScreenerError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

const NAME_HEADER: &str = "Name";
const SERIAL_HEADER: &str = "S.No.";
// Aggregate rows ("Median: 12 Co.") are not companies.
const AGGREGATE_MARKER: &str = "median";

/// Source of peer rows keyed by the numeric company id.
#[async_trait]
pub trait PeerApi: Send + Sync {
    /// Must fail (rather than return an empty list) when there is nothing to show.
    async fn fetch_peers(&self, company_id: &str) -> Result<Vec<Value>, ScreenerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyLink {
    pub name: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerRecord {
    pub company: CompanyLink,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerTable {
    /// "Name" followed by one header per metric.
    pub headers: Vec<String>,
    pub records: Vec<PeerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "table", rename_all = "snake_case")]
pub enum PeerOutcome {
    Api(PeerTable),
    Html(PeerTable),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerState {
    Unresolved,
    ApiAttempted,
    ApiSuccess,
    ApiFailed,
    HtmlAttempted,
    HtmlSuccess,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerResolution {
    pub company_id: Option<String>,
    pub outcome: PeerOutcome,
    /// Why the API path was abandoned; diagnostics only.
    pub api_failure: Option<String>,
    /// States visited, in order.
    pub trail: Vec<PeerState>,
}

fn is_aggregate(name: &str) -> bool {
    name.to_lowercase().contains(AGGREGATE_MARKER)
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Turns API peer objects into records. The name comes from `name`/`Name`, the
/// link from `url`/`href`; every other field becomes a metric. Metric columns
/// are the union of keys over all accepted rows in first-seen order, and a row
/// lacking a key gets an empty cell in that column.
pub fn peers_from_api(peers: &[Value], config: &ExtractorConfig) -> PeerTable {
    const NAME_KEYS: [&str; 2] = ["name", "Name"];
    const LINK_KEYS: [&str; 3] = ["url", "href", "link"];

    let mut metric_keys: Vec<String> = Vec::new();
    let mut accepted = Vec::new();
    for peer in peers {
        let Some(obj) = peer.as_object() else {
            tracing::debug!("Ignoring non-object peer entry: {}", peer);
            continue;
        };
        let name = NAME_KEYS
            .iter()
            .find_map(|k| obj.get(*k))
            .map(value_to_cell)
            .unwrap_or_default();
        if name.is_empty() || is_aggregate(&name) {
            continue;
        }
        let href = LINK_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(|h| config.absolutize(h));

        for key in obj.keys() {
            let is_metric = !NAME_KEYS.contains(&key.as_str()) && !LINK_KEYS.contains(&key.as_str());
            if is_metric && !metric_keys.contains(key) {
                metric_keys.push(key.clone());
            }
        }
        accepted.push((CompanyLink { name, href }, obj));
    }

    let records = accepted
        .into_iter()
        .map(|(company, obj)| PeerRecord {
            company,
            metrics: metric_keys
                .iter()
                .map(|k| obj.get(k).map(value_to_cell).unwrap_or_default())
                .collect(),
        })
        .collect();
    let mut headers = vec![NAME_HEADER.to_string()];
    headers.extend(metric_keys);
    PeerTable { headers, records }
}

/// The peer table embedded in the page: `section#peers`, else any data table
/// whose header names both "S.No." and "Name".
pub fn locate_peer_table<N: HtmlNode>(root: N) -> Option<N> {
    let in_section = root
        .descendants_by_tag(&["section"])
        .into_iter()
        .find(|s| s.attr("id") == Some("peers"))
        .and_then(|s| s.first_descendant(&["table"]));
    if in_section.is_some() {
        return in_section;
    }

    root.descendants_by_tag(&["table"]).into_iter().find(|t| {
        let headers: Vec<String> = t
            .descendants_by_tag(&["th"])
            .iter()
            .map(|th| th.joined_text(""))
            .collect();
        t.has_class("data-table")
            && headers.iter().any(|h| h == SERIAL_HEADER)
            && headers.iter().any(|h| h == NAME_HEADER)
    })
}

/// Parses the in-page peer table. Rows tagged with `data-row-company-id` are
/// preferred; aggregate rows are always dropped.
pub fn parse_peer_table<N: HtmlNode>(table: N, config: &ExtractorConfig) -> Extraction<PeerTable> {
    let header_cells: Vec<String> = table
        .descendants_by_tag(&["th"])
        .iter()
        .map(|th| th.joined_text(""))
        .collect();
    if header_cells.is_empty() {
        return Extraction::Failed(
            ExtractError::MissingElement("peer table header".to_string()).to_string(),
        );
    }

    let name_idx = header_cells
        .iter()
        .position(|h| h == NAME_HEADER)
        .unwrap_or(if header_cells[0] == SERIAL_HEADER { 1 } else { 0 });

    let all_rows: Vec<N> = table
        .descendants_by_tag(&["tr"])
        .into_iter()
        .filter(|tr| !tr.children_by_tag(&["td"]).is_empty())
        .collect();
    let tagged: Vec<N> = all_rows
        .iter()
        .copied()
        .filter(|tr| tr.attr("data-row-company-id").is_some())
        .collect();
    let rows = if tagged.is_empty() { all_rows } else { tagged };

    let mut records = Vec::new();
    for tr in rows {
        let cells = tr.children_by_tag(&["td"]);
        let Some(name_cell) = cells.get(name_idx) else {
            continue;
        };
        let anchor = name_cell.first_descendant(&["a"]);
        let name = anchor
            .map(|a| a.joined_text(""))
            .unwrap_or_else(|| name_cell.joined_text(""));
        if name.is_empty() || is_aggregate(&name) {
            tracing::debug!("Dropping peer row '{}'", name);
            continue;
        }
        let href = anchor
            .as_ref()
            .and_then(|a| a.attr("href"))
            .map(|h| config.absolutize(h));
        let metrics = cells
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != name_idx)
            .map(|(_, td)| td.joined_text(""))
            .collect();
        records.push(PeerRecord {
            company: CompanyLink { name, href },
            metrics,
        });
    }

    if records.is_empty() {
        return Extraction::Empty;
    }
    let mut headers = vec![NAME_HEADER.to_string()];
    headers.extend(
        header_cells
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != name_idx)
            .map(|(_, h)| h),
    );
    Extraction::Found(PeerTable { headers, records })
}

/// The in-page fallback, computed from the tree up front so no parse tree has
/// to live across the API call.
pub fn extract_html_peers<N: HtmlNode>(root: N, config: &ExtractorConfig) -> Extraction<PeerTable> {
    match locate_peer_table(root) {
        Some(table) => parse_peer_table(table, config),
        None => {
            tracing::debug!("No peer table in page");
            Extraction::Empty
        }
    }
}

/// Numeric id embedded in the page (`data-company-id`).
pub fn page_company_id<N: HtmlNode>(root: N) -> Option<String> {
    root.descendants()
        .into_iter()
        .find_map(|el| el.attr("data-company-id").map(|v| v.trim().to_string()))
        .filter(|id| !id.is_empty())
}

/// API first, then the in-page table. Exactly one source is surfaced.
pub async fn resolve_peers<A: PeerApi + ?Sized>(
    api: &A,
    company_id: Option<&str>,
    html_fallback: Extraction<PeerTable>,
    config: &ExtractorConfig,
) -> PeerResolution {
    let mut trail = vec![PeerState::Unresolved];
    let mut api_failure = None;

    match company_id {
        Some(id) => {
            trail.push(PeerState::ApiAttempted);
            let attempt = match api.fetch_peers(id).await {
                Ok(rows) => {
                    let table = peers_from_api(&rows, config);
                    if table.records.is_empty() {
                        Err("peer API rows carried no usable companies".to_string())
                    } else {
                        Ok(table)
                    }
                }
                Err(e) => Err(e.to_string()),
            };
            match attempt {
                Ok(table) => {
                    trail.push(PeerState::ApiSuccess);
                    tracing::info!("Peer data from API: {} rows", table.records.len());
                    return PeerResolution {
                        company_id: Some(id.to_string()),
                        outcome: PeerOutcome::Api(table),
                        api_failure: None,
                        trail,
                    };
                }
                Err(reason) => {
                    tracing::warn!("Peer API failed for company {}: {}", id, reason);
                    trail.push(PeerState::ApiFailed);
                    api_failure = Some(reason);
                }
            }
        }
        None => tracing::info!("No company id known; skipping peer API"),
    }

    trail.push(PeerState::HtmlAttempted);
    let outcome = match html_fallback {
        Extraction::Found(table) => {
            trail.push(PeerState::HtmlSuccess);
            tracing::info!("Peer data from page: {} rows", table.records.len());
            PeerOutcome::Html(table)
        }
        Extraction::Empty => {
            trail.push(PeerState::NotFound);
            PeerOutcome::NotFound
        }
        Extraction::Failed(reason) => {
            tracing::warn!("In-page peer table unusable: {}", reason);
            trail.push(PeerState::NotFound);
            PeerOutcome::NotFound
        }
    };

    PeerResolution {
        company_id: company_id.map(str::to_string),
        outcome,
        api_failure,
        trail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use scraper::Html;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PEER_PAGE: &str = r#"
      <html><body>
      <section id="peers" class="card">
        <h2>Peer comparison</h2>
        <table class="data-table">
          <tr><th>S.No.</th><th>Name</th><th>CMP Rs.</th><th>P/E</th></tr>
          <tr data-row-company-id="1"><td>1.</td><td><a href="/company/TCS/">TCS</a></td><td>3900</td><td>30</td></tr>
          <tr data-row-company-id="2"><td>2.</td><td><a href="/company/INFY/">Infosys</a></td><td>1500</td><td>25</td></tr>
          <tr><td></td><td><b>Median: 2 Co.</b></td><td>2700</td><td>27.5</td></tr>
        </table>
      </section>
      </body></html>"#;

    enum FakeApi {
        Status(StatusCode),
        Rows(Vec<Value>),
    }

    struct CountingApi {
        inner: FakeApi,
        calls: AtomicUsize,
    }

    impl CountingApi {
        fn new(inner: FakeApi) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PeerApi for CountingApi {
        async fn fetch_peers(&self, _company_id: &str) -> Result<Vec<Value>, ScreenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.inner {
                FakeApi::Status(status) => Err(ScreenerError::Http(*status)),
                FakeApi::Rows(rows) if rows.is_empty() => {
                    Err(ScreenerError::EmptyPayload("no peers".to_string()))
                }
                FakeApi::Rows(rows) => Ok(rows.clone()),
            }
        }
    }

    fn html_fallback() -> Extraction<PeerTable> {
        let doc = Html::parse_document(PEER_PAGE);
        extract_html_peers(doc.root_element(), &ExtractorConfig::default())
    }

    #[test]
    fn html_table_drops_median_and_keeps_links() {
        let Extraction::Found(table) = html_fallback() else {
            panic!("expected a peer table");
        };
        assert_eq!(table.headers, vec!["Name", "S.No.", "CMP Rs.", "P/E"]);
        let names: Vec<_> = table.records.iter().map(|r| r.company.name.as_str()).collect();
        assert_eq!(names, vec!["TCS", "Infosys"]);
        assert_eq!(
            table.records[0].company.href.as_deref(),
            Some("https://www.screener.in/company/TCS/")
        );
        assert_eq!(table.records[1].metrics, vec!["2.", "1500", "25"]);
    }

    #[test]
    fn untagged_rows_are_used_when_no_row_carries_an_id() {
        let doc = Html::parse_document(
            r#"<body><table class="data-table">
              <tr><th>S.No.</th><th>Name</th><th>P/E</th></tr>
              <tr><td>1.</td><td>Alpha</td><td>10</td></tr>
              <tr><td></td><td>Median: 1 Co.</td><td>10</td></tr>
            </table></body>"#,
        );
        let Extraction::Found(table) = extract_html_peers(doc.root_element(), &ExtractorConfig::default())
        else {
            panic!("expected a peer table");
        };
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].company, CompanyLink { name: "Alpha".to_string(), href: None });
    }

    #[test]
    fn api_rows_with_different_fields_stay_aligned() {
        let rows = vec![
            json!({"name": "A", "pe": 1, "roce": 2}),
            json!({"name": "B", "roce": 3}),
            json!({"name": "C", "pe": 4, "mcap": 500}),
        ];
        let table = peers_from_api(&rows, &ExtractorConfig::default());
        assert_eq!(table.headers, vec!["Name", "pe", "roce", "mcap"]);
        assert_eq!(table.records[0].metrics, vec!["1", "2", ""]);
        assert_eq!(table.records[1].metrics, vec!["", "3", ""]);
        assert_eq!(table.records[2].metrics, vec!["4", "", "500"]);
        for record in &table.records {
            assert_eq!(record.metrics.len(), table.headers.len() - 1);
        }
    }

    #[tokio::test]
    async fn api_failure_falls_back_to_html_without_median() {
        let api = CountingApi::new(FakeApi::Status(StatusCode::INTERNAL_SERVER_ERROR));
        let res = resolve_peers(&api, Some("2726"), html_fallback(), &ExtractorConfig::default()).await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        let PeerOutcome::Html(table) = &res.outcome else {
            panic!("expected html outcome, got {:?}", res.outcome);
        };
        assert!(table.records.iter().all(|r| !r.company.name.contains("Median")));
        assert!(res.api_failure.as_deref().unwrap().contains("500"));
        assert_eq!(
            res.trail,
            vec![
                PeerState::Unresolved,
                PeerState::ApiAttempted,
                PeerState::ApiFailed,
                PeerState::HtmlAttempted,
                PeerState::HtmlSuccess
            ]
        );
    }

    #[tokio::test]
    async fn api_rows_take_precedence() {
        let api = CountingApi::new(FakeApi::Rows(vec![
            json!({"name": "Wipro", "url": "/company/WIPRO/", "pe": 22.5}),
            json!({"name": "Median: 3 Co.", "pe": 20}),
        ]));
        let res = resolve_peers(&api, Some("1"), html_fallback(), &ExtractorConfig::default()).await;
        let PeerOutcome::Api(table) = &res.outcome else {
            panic!("expected api outcome");
        };
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.headers, vec!["Name", "pe"]);
        assert_eq!(table.records[0].metrics, vec!["22.5"]);
        assert_eq!(res.trail.last(), Some(&PeerState::ApiSuccess));
        assert!(res.api_failure.is_none());
    }

    #[tokio::test]
    async fn empty_api_list_counts_as_failure() {
        let api = CountingApi::new(FakeApi::Rows(vec![]));
        let res = resolve_peers(&api, Some("1"), Extraction::Empty, &ExtractorConfig::default()).await;
        assert_eq!(res.outcome, PeerOutcome::NotFound);
        assert!(res.api_failure.is_some());
        assert_eq!(res.trail.last(), Some(&PeerState::NotFound));
    }

    #[test]
    fn unknown_id_skips_the_api() {
        let api = CountingApi::new(FakeApi::Rows(vec![json!({"name": "X"})]));
        let res = tokio_test::block_on(resolve_peers(
            &api,
            None,
            html_fallback(),
            &ExtractorConfig::default(),
        ));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(res.outcome, PeerOutcome::Html(_)));
        assert_eq!(
            res.trail,
            vec![PeerState::Unresolved, PeerState::HtmlAttempted, PeerState::HtmlSuccess]
        );
    }

    #[test]
    fn page_company_id_reads_data_attribute() {
        let doc = Html::parse_document(r#"<body><div id="x" data-company-id=" 2726 "></div></body>"#);
        assert_eq!(page_company_id(doc.root_element()).as_deref(), Some("2726"));
        let none = Html::parse_document("<body></body>");
        assert_eq!(page_company_id(none.root_element()), None);
    }
}
