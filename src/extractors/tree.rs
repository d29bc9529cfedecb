// src/extractors/tree.rs
//! The slice of a parse tree the extractors are allowed to see.
//!
//! Everything in `extractors` is generic over [`HtmlNode`]; the only concrete
//! implementation is `scraper::ElementRef`.

use scraper::ElementRef;

pub trait HtmlNode: Copy {
    /// Lower-case tag name.
    fn tag(&self) -> &str;

    fn attr(&self, name: &str) -> Option<&str>;

    fn has_class(&self, class: &str) -> bool;

    /// Direct element children whose tag is in `tags`, in document order.
    fn children_by_tag(&self, tags: &[&str]) -> Vec<Self>;

    /// Every element below this one (self excluded), in document order.
    fn descendants(&self) -> Vec<Self>;

    fn has_ancestor(&self, tag: &str) -> bool;

    /// Raw text nodes anywhere below this element.
    fn text_nodes(&self) -> Vec<String>;

    /// Raw text nodes that are direct children of this element.
    fn own_text_nodes(&self) -> Vec<String>;

    fn descendants_by_tag(&self, tags: &[&str]) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|el| tags.contains(&el.tag()))
            .collect()
    }

    fn first_descendant(&self, tags: &[&str]) -> Option<Self> {
        self.descendants()
            .into_iter()
            .find(|el| tags.contains(&el.tag()))
    }

    /// All text with whitespace runs collapsed to single spaces.
    fn text_content(&self) -> String {
        collapse_whitespace(&self.text_nodes().concat())
    }

    /// Each text node trimmed, empties dropped, joined by `sep`.
    fn joined_text(&self, sep: &str) -> String {
        self.text_nodes()
            .iter()
            .map(|t| collapse_whitespace(t))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> HtmlNode for ElementRef<'a> {
    fn tag(&self) -> &str {
        self.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn has_class(&self, class: &str) -> bool {
        self.value().classes().any(|c| c == class)
    }

    fn children_by_tag(&self, tags: &[&str]) -> Vec<Self> {
        self.children()
            .filter_map(ElementRef::wrap)
            .filter(|el| tags.contains(&el.value().name()))
            .collect()
    }

    fn descendants(&self) -> Vec<Self> {
        // ego_tree yields the node itself first.
        (**self)
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .collect()
    }

    fn has_ancestor(&self, tag: &str) -> bool {
        self.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().name() == tag)
    }

    fn text_nodes(&self) -> Vec<String> {
        ElementRef::text(self).map(str::to_string).collect()
    }

    fn own_text_nodes(&self) -> Vec<String> {
        self.children()
            .filter_map(|node| node.value().as_text().map(|t| String::from(&*t.text)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn traversal_over_scraper_tree() {
        let doc = Html::parse_document(
            r#"<body><section id="s"><h2> Quarterly
               Results </h2><div class="a b"><span>x</span>tail</div></section></body>"#,
        );
        let root = doc.root_element();
        let section = root.first_descendant(&["section"]).unwrap();
        assert_eq!(section.attr("id"), Some("s"));
        assert_eq!(
            section.first_descendant(&["h2"]).unwrap().text_content(),
            "Quarterly Results"
        );

        let div = section.children_by_tag(&["div"])[0];
        assert!(div.has_class("b"));
        assert!(!div.has_class("c"));
        assert_eq!(div.own_text_nodes(), vec!["tail".to_string()]);
        assert_eq!(div.joined_text("|"), "x|tail");

        let span = div.first_descendant(&["span"]).unwrap();
        assert!(span.has_ancestor("section"));
        assert!(!span.has_ancestor("table"));
        assert!(section.descendants_by_tag(&["li"]).is_empty());
    }
}
