//! Nyonya Cooking lists ingredients as `<dt>` amount / `<dd>` name pairs.

use super::dom;
use super::SiteAdapter;
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Facts, Ingredients};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::time::Duration;

pub struct NyonyaCookingAdapter {
    settle: Duration,
}

impl NyonyaCookingAdapter {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl SiteAdapter for NyonyaCookingAdapter {
    fn name(&self) -> &'static str {
        "Nyonya Cooking"
    }

    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError> {
        page.pause(self.settle).await;
        let html = page.content().await?;
        Ok(parse(&html))
    }
}

pub fn parse(html: &str) -> ExtractionResult {
    let doc = Html::parse_document(html);
    ExtractionResult {
        ingredients: Ingredients::main(ingredients(&doc)),
        method: method(&doc),
        nutrition: nutrition(&doc),
        metadata: None,
    }
}

fn ingredients(doc: &Html) -> Vec<String> {
    let Some(sel) = dom::selector(".recipe-ingredients dl.row dt, .recipe-ingredients dl.row dd")
    else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut amount: Option<String> = None;
    for el in doc.select(&sel) {
        let text = dom::element_text(el);
        if el.value().name() == "dt" {
            amount = Some(text);
            continue;
        }
        let line = match amount.take() {
            Some(a) if !a.is_empty() => format!("{} {}", a, text),
            _ => text,
        };
        if !line.trim().is_empty() {
            out.push(line.trim().to_string());
        }
    }
    out
}

fn method(doc: &Html) -> Vec<String> {
    let Some(sel) = dom::selector("article.card.shadow-sm.article-body") else {
        return Vec::new();
    };
    doc.select(&sel)
        .filter_map(|step| dom::first_within(step, "span p"))
        .map(dom::element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

fn nutrition(doc: &Html) -> Option<Facts> {
    let sel = dom::selector(".row .col-6.col-md-3")?;
    let facts: Facts = doc
        .select(&sel)
        .filter_map(|item| {
            let label = dom::first_within(item, ".label-sm").map(dom::element_text)?;
            let value = value_of(item).map(dom::element_text)?;
            Some((label, value))
        })
        .collect();
    (!facts.is_empty()).then_some(facts)
}

/// First `<div>` in a nutrition cell that is not the label.
fn value_of(item: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let sel = dom::selector("div")?;
    item.select(&sel).find(|div| {
        !div.value().classes().any(|c| c == "label-sm")
    })
}
