// src/extractors/concalls.rs
use crate::config::ExtractorConfig;
use crate::extractors::tree::HtmlNode;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

// Month abbreviation (optionally spelled out) followed by a 4-digit year, at the start.
static CONCALL_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{4})")
        .expect("Failed to compile CONCALL_DATE_RE")
});

/// Document types a concall row can link to. Declaration order is display order:
/// the fixed slots first, then any extra recognised type alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ConcallDoc {
    Transcript,
    Notes,
    #[serde(rename = "PPT")]
    Ppt,
    #[serde(rename = "REC")]
    Rec,
}

impl ConcallDoc {
    pub const FIXED_SLOTS: [ConcallDoc; 3] = [ConcallDoc::Transcript, ConcallDoc::Notes, ConcallDoc::Ppt];

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "transcript" => Some(ConcallDoc::Transcript),
            "notes" => Some(ConcallDoc::Notes),
            "ppt" => Some(ConcallDoc::Ppt),
            "rec" => Some(ConcallDoc::Rec),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcallEntry {
    /// Display date as written on the page, e.g. "Jun 2023".
    pub date: String,
    /// First day of the call's month; the sort and grouping key.
    #[serde(skip)]
    pub period: NaiveDate,
    pub documents: BTreeMap<ConcallDoc, Option<String>>,
}

impl ConcallEntry {
    fn new(date: String, period: NaiveDate) -> Self {
        let documents = ConcallDoc::FIXED_SLOTS.iter().map(|d| (*d, None)).collect();
        Self {
            date,
            period,
            documents,
        }
    }

    /// Fills a slot. A known href is never replaced by a missing one.
    fn record(&mut self, doc: ConcallDoc, href: Option<String>) {
        let slot = self.documents.entry(doc).or_insert(None);
        if href.is_some() {
            *slot = href;
        }
    }

    fn absorb(&mut self, other: ConcallEntry) {
        for (doc, href) in other.documents {
            self.record(doc, href);
        }
    }

    pub fn has_links(&self) -> bool {
        self.documents.values().any(Option::is_some)
    }
}

/// Parses "Jun 2023" / "June 2023" into the first day of that month.
pub fn parse_concall_date(text: &str) -> Option<NaiveDate> {
    let caps = CONCALL_DATE_RE.captures(text.trim())?;
    let month = match caps[1].to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    let year: i32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn extract_entry<N: HtmlNode>(li: N, config: &ExtractorConfig) -> Option<ConcallEntry> {
    let date = li.first_descendant(&["div"])?.joined_text("");
    let period = parse_concall_date(&date)?;
    let mut entry = ConcallEntry::new(date, period);

    for el in li.descendants_by_tag(&["a", "button", "div"]) {
        let Some(doc) = ConcallDoc::from_label(&el.joined_text("")) else {
            continue;
        };
        let href = if el.tag() == "a" {
            el.attr("href").map(|h| config.absolutize(h))
        } else {
            None
        };
        entry.record(doc, href);
    }
    Some(entry)
}

/// Concall rows grouped per month, newest first.
pub fn extract_concalls<N: HtmlNode>(root: N, config: &ExtractorConfig) -> Vec<ConcallEntry> {
    let mut entries: Vec<ConcallEntry> = Vec::new();
    for li in root.descendants_by_tag(&["li"]) {
        let Some(entry) = extract_entry(li, config) else {
            continue;
        };
        match entries.iter_mut().find(|e| e.period == entry.period) {
            Some(existing) => {
                tracing::debug!("Merging duplicate concall row for {}", entry.date);
                existing.absorb(entry);
            }
            None => entries.push(entry),
        }
    }

    entries.sort_by(|a, b| b.period.cmp(&a.period));
    tracing::debug!("Found {} concall dates", entries.len());
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn concalls(html: &str) -> Vec<ConcallEntry> {
        let doc = Html::parse_document(html);
        extract_concalls(doc.root_element(), &ExtractorConfig::default())
    }

    #[test]
    fn orders_across_year_boundaries_by_real_date() {
        let entries = concalls(
            r#"<ul>
              <li><div>Dec 2022</div><a href="/t1">Transcript</a></li>
              <li><div>Feb 2023</div><a href="/t2">Transcript</a></li>
              <li><div>Nov 2022</div><div>Notes</div></li>
              <li><div>Aug 2023</div><button>PPT</button></li>
            </ul>"#,
        );
        let dates: Vec<_> = entries.iter().map(|e| e.date.as_str()).collect();
        // A lexical sort would put "Nov 2022" ahead of "Aug 2023".
        assert_eq!(dates, vec!["Aug 2023", "Feb 2023", "Dec 2022", "Nov 2022"]);
    }

    #[test]
    fn slots_record_hrefs_only_for_anchors() {
        let entries = concalls(
            r#"<ul><li><div>May 2024</div>
                <a class="concall-link" href="https://bse.test/t.pdf">Transcript</a>
                <div class="concall-link">Notes</div>
                <button>PPT</button>
                <a href="/rec">REC</a>
                <a href="/x">Audio</a>
            </li></ul>"#,
        );
        assert_eq!(entries.len(), 1);
        let docs = &entries[0].documents;
        assert_eq!(docs[&ConcallDoc::Transcript].as_deref(), Some("https://bse.test/t.pdf"));
        assert_eq!(docs[&ConcallDoc::Notes], None);
        assert_eq!(docs[&ConcallDoc::Ppt], None);
        assert_eq!(docs[&ConcallDoc::Rec].as_deref(), Some("https://www.screener.in/rec"));
        let order: Vec<_> = docs.keys().copied().collect();
        assert_eq!(
            order,
            vec![ConcallDoc::Transcript, ConcallDoc::Notes, ConcallDoc::Ppt, ConcallDoc::Rec]
        );
    }

    #[test]
    fn duplicate_dates_union_their_links() {
        let entries = concalls(
            r#"<ul>
              <li><div>Jan 2024</div><a href="/t">Transcript</a><div>PPT</div></li>
              <li><div>January 2024</div><div>Transcript</div><a href="/p">PPT</a></li>
            </ul>"#,
        );
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.date, "Jan 2024");
        assert!(e.has_links());
        assert_eq!(e.documents[&ConcallDoc::Transcript].as_deref(), Some("https://www.screener.in/t"));
        assert_eq!(e.documents[&ConcallDoc::Ppt].as_deref(), Some("https://www.screener.in/p"));
    }

    #[test]
    fn rejects_items_without_a_leading_month_year() {
        let entries = concalls(
            r#"<ul>
              <li><a href="/a"><div>27 Apr 2024 - Board meeting</div></a></li>
              <li><div>Financial Year 2023</div></li>
              <li>Jun 2023</li>
            </ul>"#,
        );
        assert!(entries.is_empty());
    }

    #[test]
    fn date_parsing() {
        assert_eq!(parse_concall_date("Sep 2021"), NaiveDate::from_ymd_opt(2021, 9, 1));
        assert_eq!(parse_concall_date("october 2020 "), NaiveDate::from_ymd_opt(2020, 10, 1));
        assert_eq!(parse_concall_date("Q3 2021"), None);
    }
}
