// src/extractors/links.rs
use crate::config::ExtractorConfig;
use crate::extractors::concalls::{extract_concalls, ConcallEntry};
use crate::extractors::tree::{collapse_whitespace, HtmlNode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static FINANCIAL_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Financial Year \d{4}").expect("Failed to compile FINANCIAL_YEAR_RE")
});

static LEADING_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^from\s+").expect("Failed to compile LEADING_FROM_RE"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub title: String,
    pub href: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualReport {
    /// "Financial Year 2023 from bse" when a source label was present.
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditRating {
    pub title: String,
    pub href: String,
}

/// Document links bucketed by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorizedLinks {
    pub announcements: Vec<Announcement>,
    pub annual_reports: Vec<AnnualReport>,
    pub credit_ratings: Vec<CreditRating>,
    pub concalls: Vec<ConcallEntry>,
}

impl CategorizedLinks {
    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
            && self.annual_reports.is_empty()
            && self.credit_ratings.is_empty()
            && self.concalls.is_empty()
    }
}

fn anchors_with_href<N: HtmlNode>(root: N) -> Vec<(N, String)> {
    root.descendants_by_tag(&["a"])
        .into_iter()
        .filter_map(|a| a.attr("href").map(|h| (a, h.to_string())))
        .collect()
}

/// Items of the `ul.list-links` container; each holds one anchor whose first
/// text node is the title and whose first other non-empty block is the summary.
pub fn extract_announcements<N: HtmlNode>(root: N, config: &ExtractorConfig) -> Vec<Announcement> {
    let Some(list) = root
        .descendants_by_tag(&["ul"])
        .into_iter()
        .find(|ul| ul.has_class("list-links"))
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for li in list
        .children_by_tag(&["li"])
        .into_iter()
        .filter(|li| li.has_class("overflow-wrap-anywhere"))
    {
        let Some((a, href)) = anchors_with_href(li).into_iter().next() else {
            continue;
        };
        let title = a
            .own_text_nodes()
            .iter()
            .map(|t| collapse_whitespace(t))
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| a.text_content());
        let summary = a
            .descendants_by_tag(&["div", "span"])
            .into_iter()
            .map(|el| el.text_content())
            .find(|t| !t.is_empty() && *t != title);

        out.push(Announcement {
            title,
            href: config.absolutize(&href),
            summary,
        });
    }
    out
}

/// Anchors starting with "Financial Year NNNN" or mentioning "annual report".
pub fn extract_annual_reports<N: HtmlNode>(root: N, config: &ExtractorConfig) -> Vec<AnnualReport> {
    let mut out = Vec::new();
    for (a, href) in anchors_with_href(root) {
        let anchor_text = a.joined_text(" ");
        let is_annual = FINANCIAL_YEAR_RE.is_match(&anchor_text)
            || anchor_text.to_lowercase().contains("annual report");
        if !is_annual {
            continue;
        }

        let source_raw = a
            .descendants_by_tag(&["span", "div"])
            .into_iter()
            .find(|el| el.has_class("sub"))
            .map(|el| el.joined_text(""))
            .unwrap_or_default();

        let mut title = anchor_text.clone();
        if !source_raw.is_empty() {
            title = collapse_whitespace(&anchor_text.replace(&source_raw, ""));
        }
        let source = LEADING_FROM_RE.replace(&source_raw, "").trim().to_string();
        if !source.is_empty() {
            title = format!("{} from {}", title, source);
        }

        out.push(AnnualReport {
            title,
            href: config.absolutize(&href),
        });
    }
    out
}

/// Anchors whose text or href mentions a rating agency or rating keyword.
pub fn extract_credit_ratings<N: HtmlNode>(root: N, config: &ExtractorConfig) -> Vec<CreditRating> {
    anchors_with_href(root)
        .into_iter()
        .filter(|(a, href)| {
            let text = a.text_content().to_lowercase();
            let href = href.to_lowercase();
            config
                .credit_vocabulary
                .iter()
                .any(|token| text.contains(token.as_str()) || href.contains(token.as_str()))
        })
        .map(|(a, href)| CreditRating {
            title: a.text_content(),
            href: config.absolutize(&href),
        })
        .collect()
}

pub fn categorize_links<N: HtmlNode>(root: N, config: &ExtractorConfig) -> CategorizedLinks {
    let links = CategorizedLinks {
        announcements: extract_announcements(root, config),
        annual_reports: extract_annual_reports(root, config),
        credit_ratings: extract_credit_ratings(root, config),
        concalls: extract_concalls(root, config),
    };
    tracing::info!(
        "Categorized links: {} announcements, {} annual reports, {} credit ratings, {} concalls",
        links.announcements.len(),
        links.annual_reports.len(),
        links.credit_ratings.len(),
        links.concalls.len()
    );
    links
}
