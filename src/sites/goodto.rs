//! Good To (goodto.com and goodtoknow.co.uk).
//!
//! Recipes are plain article content: lists after "Ingredients" and
//! "Method" headings, a "NUTRITION PER PORTION" table, and a block of
//! serving and timing facts that is kept as metadata.

use super::dom::{self, AfterHeading};
use super::{FallbackPolicy, SiteAdapter};
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Facts, Ingredients};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::time::Duration;

const METADATA_LABELS: &[&str] = &["Serves", "Skill", "Preparation Time", "Cooking Time", "Total Time"];
const NUTRITION_HEADING: &str = "NUTRITION PER PORTION";

/// `Calories 250kcal` pairs in running text. Only known units attach to a
/// figure.
static NUTRITION_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z ]*?)\s+([0-9.]+(?:[ \t]?(?i:(?:kcal|kj|mcg|mg|g)\b|%))?)").unwrap()
});

pub struct GoodToAdapter {
    settle: Duration,
}

impl GoodToAdapter {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl SiteAdapter for GoodToAdapter {
    fn name(&self) -> &'static str {
        "Good To"
    }

    fn fallback(&self) -> FallbackPolicy {
        FallbackPolicy::Never
    }

    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError> {
        page.pause(self.settle).await;
        let html = page.content().await?;
        Ok(parse(&html))
    }
}

pub fn parse(html: &str) -> ExtractionResult {
    let doc = Html::parse_document(html);

    let main = dom::items_after_heading(
        &doc,
        AfterHeading {
            tags: &["h2", "h3"],
            label: "Ingredients",
            sibling: "ul",
            first_only: false,
            items: Some("li"),
        },
    )
    .into_iter()
    .filter(|line| !line.to_lowercase().contains("for the"))
    .collect();

    let method = dom::items_after_heading(
        &doc,
        AfterHeading {
            tags: &["h2", "h3"],
            label: "Method",
            sibling: "ol",
            first_only: false,
            items: Some("li"),
        },
    );

    let metadata: Facts = METADATA_LABELS
        .iter()
        .filter_map(|label| dom::labelled_value(&doc, label).map(|v| (label.to_string(), v)))
        .collect();

    ExtractionResult {
        ingredients: Ingredients::main(main),
        method,
        nutrition: nutrition(&doc),
        metadata: (!metadata.is_empty()).then_some(metadata),
    }
}

fn nutrition(doc: &Html) -> Option<Facts> {
    let mut facts = Facts::new();
    for heading in dom::innermost_containing(doc, NUTRITION_HEADING) {
        let tables = dom::following_siblings(heading, "table");
        let Some(row_sel) = dom::selector("tr") else {
            continue;
        };
        for row in tables.iter().flat_map(|t| t.select(&row_sel)) {
            if let [label, value, ..] = dom::texts_within(row, "td").as_slice() {
                facts.entry(label.clone()).or_insert_with(|| value.clone());
            }
        }

        if facts.is_empty() {
            // Some articles print the figures as a run of text under the heading
            let container = heading
                .parent()
                .and_then(scraper::ElementRef::wrap)
                .unwrap_or(heading);
            let text = dom::element_text(container);
            if let Some(pos) = text.find(NUTRITION_HEADING) {
                for cap in NUTRITION_TEXT.captures_iter(&text[pos + NUTRITION_HEADING.len()..]) {
                    facts
                        .entry(cap[1].trim().to_string())
                        .or_insert_with(|| cap[2].trim().to_string());
                }
            }
        }
    }
    (!facts.is_empty()).then_some(facts)
}
