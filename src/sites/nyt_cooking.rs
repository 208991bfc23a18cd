//! NYT Cooking. Class names carry build hashes, so each section has a few
//! candidate selectors. The site publishes no usable nutrition, and its
//! markup defeats the generic cascade, so there is no fallback.

use super::dom;
use super::{FallbackPolicy, SiteAdapter};
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Ingredients};
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const INGREDIENTS: &[&str] = &[
    ".ingredients_ingredient__VJJH9",
    ".ingredients_ingredientGroup__jYQJu li",
    ".pantry--body-long",
];

const STEPS: &[&str] = &[".preparation_stepContent__CFrQM p", "[class^=\"preparation_step\"] p"];

pub struct NytCookingAdapter {
    settle: Duration,
}

impl NytCookingAdapter {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl SiteAdapter for NytCookingAdapter {
    fn name(&self) -> &'static str {
        "NYT Cooking"
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
    ExtractionResult {
        ingredients: Ingredients::main(dom::first_texts(&doc, INGREDIENTS)),
        method: dom::first_texts(&doc, STEPS),
        nutrition: None,
        metadata: None,
    }
}
