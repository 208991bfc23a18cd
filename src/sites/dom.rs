//! DOM query helpers shared by the site adapters.
//!
//! Adapters read a rendered snapshot of the page with `scraper`. Text-based
//! selection (`heading containing "Method"` and the like) is done here
//! because CSS cannot express it.

use crate::models::collapse_whitespace;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Parse a selector, logging instead of failing on bad input.
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            log::debug!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

/// Whitespace-collapsed text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Non-empty texts of every element matching `css`, in document order.
pub fn texts(doc: &Html, css: &str) -> Vec<String> {
    match selector(css) {
        Some(sel) => doc
            .select(&sel)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Non-empty texts of descendants of `el` matching `css`.
pub fn texts_within(el: ElementRef<'_>, css: &str) -> Vec<String> {
    match selector(css) {
        Some(sel) => el
            .select(&sel)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Texts from the first selector that matches anything.
pub fn first_texts(doc: &Html, selectors: &[&str]) -> Vec<String> {
    for css in selectors {
        let found = texts(doc, css);
        if !found.is_empty() {
            log::debug!("Matched {} elements with selector: {}", found.len(), css);
            return found;
        }
    }
    Vec::new()
}

/// First descendant of `el` matching `css`.
pub fn first_within<'a>(el: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    selector(css).and_then(|sel| el.select(&sel).next())
}

/// Elements with one of `tags` whose text contains `label`, ignoring case.
pub fn headings<'a>(doc: &'a Html, tags: &[&str], label: &str) -> Vec<ElementRef<'a>> {
    let needle = label.to_lowercase();
    let Some(sel) = selector(&tags.join(", ")) else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter(|el| element_text(*el).to_lowercase().contains(&needle))
        .collect()
}

/// Following sibling elements named `tag`.
pub fn following_siblings<'a>(el: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|sib| sib.value().name() == tag)
        .collect()
}

/// Next sibling element, skipping text nodes.
pub fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Where to look after a heading.
#[derive(Debug, Clone, Copy)]
pub struct AfterHeading<'s> {
    /// Heading tags, e.g. `["h2", "h3"]`
    pub tags: &'s [&'s str],
    pub label: &'s str,
    /// Sibling element to look in, e.g. `"ol"`
    pub sibling: &'s str,
    /// Only the first such sibling
    pub first_only: bool,
    /// Items inside the sibling; `None` takes the sibling's own text
    pub items: Option<&'s str>,
}

/// Text of items found after headings, the equivalent of
/// `h2:has-text("Method") ~ ol li`. Each element is taken once.
pub fn items_after_heading(doc: &Html, spec: AfterHeading<'_>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for heading in headings(doc, spec.tags, spec.label) {
        let mut siblings = following_siblings(heading, spec.sibling);
        if spec.first_only {
            siblings.truncate(1);
        }
        for sib in siblings {
            let items: Vec<ElementRef<'_>> = match spec.items.and_then(selector) {
                Some(sel) => sib.select(&sel).collect(),
                None => vec![sib],
            };
            for item in items {
                if seen.insert(item.id()) {
                    out.push(element_text(item));
                }
            }
        }
    }
    out
}

/// Text of `item` elements inside any `container` whose class attribute
/// contains `needle`, ignoring case. Document order, no duplicates.
pub fn items_in_classed(doc: &Html, containers: &[&str], needle: &str, item: &str) -> Vec<String> {
    let needle = needle.to_lowercase();
    let Some(item_sel) = selector(item) else {
        return Vec::new();
    };
    doc.select(&item_sel)
        .filter(|el| {
            el.ancestors().filter_map(ElementRef::wrap).any(|anc| {
                (containers.is_empty() || containers.contains(&anc.value().name()))
                    && anc
                        .value()
                        .attr("class")
                        .map(|c| c.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
        })
        .map(element_text)
        .collect()
}

/// Deepest elements inside `<body>` whose text contains `needle`.
pub fn innermost_containing<'a>(doc: &'a Html, needle: &str) -> Vec<ElementRef<'a>> {
    let Some(sel) = selector("body *") else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter(|el| el.text().collect::<String>().contains(needle))
        .filter(|el| {
            !el.children()
                .filter_map(ElementRef::wrap)
                .any(|child| child.text().collect::<String>().contains(needle))
        })
        .collect()
}

/// Value printed next to a label, e.g. `Serves 4` or `<dt>Serves</dt><dd>4</dd>`.
pub fn labelled_value(doc: &Html, label: &str) -> Option<String> {
    for el in innermost_containing(doc, label) {
        let text = element_text(el);
        let Some(pos) = text.find(label) else {
            continue;
        };
        let rest = text[pos + label.len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        if let Some(value) = next_element(el).map(element_text).filter(|v| !v.is_empty()) {
            return Some(value);
        }
    }
    None
}

/// Visible text of `<body>`, one line per block element.
pub fn body_text(doc: &Html) -> String {
    let mut out = String::new();
    let body = selector("body").and_then(|sel| doc.select(&sel).next());
    match body {
        Some(body) => push_text(body, &mut out),
        None => push_text(doc.root_element(), &mut out),
    }
    out
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed.is_empty() {
                    continue;
                }
                if text.starts_with(char::is_whitespace) && !out.ends_with(['\n', ' ']) {
                    out.push(' ');
                }
                out.push_str(&collapsed);
                if text.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
            }
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <nav><a>Recipes</a></nav>
        <h2>Ingredients</h2>
        <ul><li>200g  flour</li><li>2 eggs</li></ul>
        <ul><li>Sprinkles</li></ul>
        <h2>Method</h2>
        <ol><li>Mix.</li><li>Bake.</li></ol>
        <div class="Recipe-Nutrition"><ul><li>Fat: 3g</li></ul></div>
        <ul class="meta"><li><span>Serves</span><span>4</span></li><li>Skill: Easy</li></ul>
        <script>var ingredients = "not text";</script>
    </body></html>"#;

    #[test]
    fn test_items_after_heading_first_only() {
        let doc = Html::parse_document(PAGE);
        let spec = AfterHeading {
            tags: &["h2", "h3"],
            label: "ingredients",
            sibling: "ul",
            first_only: true,
            items: Some("li"),
        };
        assert_eq!(items_after_heading(&doc, spec), vec!["200g flour", "2 eggs"]);

        let all = AfterHeading { first_only: false, ..spec };
        assert_eq!(items_after_heading(&doc, all).len(), 4);
    }

    #[test]
    fn test_items_in_classed_is_case_insensitive() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(
            items_in_classed(&doc, &["div", "section"], "nutrition", "li"),
            vec!["Fat: 3g"]
        );
        assert!(items_in_classed(&doc, &["section"], "nutrition", "li").is_empty());
    }

    #[test]
    fn test_labelled_value_inline_and_sibling() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(labelled_value(&doc, "Skill").as_deref(), Some("Easy"));
        assert_eq!(labelled_value(&doc, "Serves").as_deref(), Some("4"));
        assert_eq!(labelled_value(&doc, "Cooking Time"), None);
    }

    #[test]
    fn test_body_text_skips_scripts_and_breaks_blocks() {
        let doc = Html::parse_document(PAGE);
        let text = body_text(&doc);
        assert!(!text.contains("not text"));
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert!(lines.contains(&"200g flour"));
        assert!(lines.contains(&"Bake."));
    }

    #[test]
    fn test_first_texts_uses_first_matching_selector() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(first_texts(&doc, &[".missing li", "ol li"]), vec!["Mix.", "Bake."]);
        assert!(first_texts(&doc, &["[[bad"]).is_empty());
    }
}
