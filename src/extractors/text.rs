// src/extractors/text.rs
use crate::extractors::tables::section_title;
use crate::extractors::tree::HtmlNode;
use serde::Serialize;

pub const OVERVIEW_TITLE: &str = "Overview";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub title: String,
    pub text: String,
}

fn meta_description<N: HtmlNode>(root: N) -> Option<String> {
    root.descendants_by_tag(&["meta"])
        .into_iter()
        .find(|m| m.attr("name") == Some("description"))
        .and_then(|m| m.attr("content").map(|c| c.trim().to_string()))
}

/// Company overview plus the text of every section, keyed by section title.
/// A later section with an already-seen title replaces the earlier text in place.
pub fn extract_text_blocks<N: HtmlNode>(root: N) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    let name = root
        .first_descendant(&["h1"])
        .map(|h1| h1.text_content())
        .filter(|n| !n.is_empty());
    if let (Some(name), Some(description)) = (name, meta_description(root)) {
        blocks.push(TextBlock {
            title: OVERVIEW_TITLE.to_string(),
            text: format!("**{}**\n\n{}", name, description),
        });
    }

    for section in root.descendants_by_tag(&["section"]) {
        let text = section.joined_text("\n");
        if text.is_empty() {
            continue;
        }
        let title = section_title(section);
        match blocks.iter_mut().find(|b| b.title == title) {
            Some(existing) => existing.text = text,
            None => blocks.push(TextBlock { title, text }),
        }
    }
    blocks
}
