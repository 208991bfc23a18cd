//! The Happy Foodie. Ingredients sit in a two-column table of amount and
//! name. No nutrition, no generic fallback.

use super::dom;
use super::{FallbackPolicy, SiteAdapter};
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Ingredients};
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

pub struct HappyFoodieAdapter {
    settle: Duration,
}

impl HappyFoodieAdapter {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl SiteAdapter for HappyFoodieAdapter {
    fn name(&self) -> &'static str {
        "The Happy Foodie"
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
    let mut main = Vec::new();
    if let Some(sel) = dom::selector(".hf-ingredients__container table tr") {
        for row in doc.select(&sel) {
            let cells = dom::texts_within(row, "td");
            let line = match cells.as_slice() {
                [] => continue,
                [only] => only.clone(),
                [amount, .., name] => format!("{} {}", amount, name),
            };
            main.push(line);
        }
    }

    ExtractionResult {
        ingredients: Ingredients::main(main),
        method: dom::texts(&doc, ".hf-method__text p"),
        nutrition: None,
        metadata: None,
    }
}
