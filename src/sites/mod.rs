//! Recipe extraction from rendered pages.
//!
//! Each supported publisher has a [`SiteAdapter`] tuned to its markup. Pages
//! from other sites, and publisher pages whose adapter comes back empty, go
//! through the [`generic::GenericAdapter`] cascade. Every result leaving
//! [`ExtractionEngine::extract`] is normalized and has both ingredients and
//! method steps.

pub mod bbc;
pub mod dom;
pub mod generic;
pub mod goodto;
pub mod happy_foodie;
pub mod nyonya_cooking;
pub mod nyt_cooking;
pub mod tastemade;

use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::ExtractionResult;
use crate::registry::{SiteId, SiteProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub use generic::GenericAdapter;

/// What happens when a publisher adapter produces nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Retry the page with the generic cascade.
    Generic,
    /// Report the adapter's error as is.
    Never,
}

/// Extraction logic for one publisher.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn fallback(&self) -> FallbackPolicy {
        FallbackPolicy::Generic
    }

    /// Read the recipe off a page that has already been navigated.
    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError>;
}

/// Picks the adapter for a classified page and enforces the completeness gate.
pub struct ExtractionEngine {
    adapters: HashMap<SiteId, Box<dyn SiteAdapter>>,
    generic: GenericAdapter,
}

impl ExtractionEngine {
    /// `settle` is how long adapters let client-side scripts run before reading.
    pub fn new(settle: Duration) -> Self {
        let mut adapters: HashMap<SiteId, Box<dyn SiteAdapter>> = HashMap::new();
        adapters.insert(SiteId::BbcGoodFood, Box::new(bbc::BbcAdapter::good_food(settle)));
        adapters.insert(SiteId::BbcFood, Box::new(bbc::BbcAdapter::food(settle)));
        adapters.insert(SiteId::Tastemade, Box::new(tastemade::TastemadeAdapter::new()));
        adapters.insert(
            SiteId::NyonyaCooking,
            Box::new(nyonya_cooking::NyonyaCookingAdapter::new(settle)),
        );
        adapters.insert(SiteId::NytCooking, Box::new(nyt_cooking::NytCookingAdapter::new(settle)));
        adapters.insert(
            SiteId::HappyFoodie,
            Box::new(happy_foodie::HappyFoodieAdapter::new(settle)),
        );
        adapters.insert(SiteId::GoodTo, Box::new(goodto::GoodToAdapter::new(settle)));

        Self {
            adapters,
            generic: GenericAdapter::new(settle),
        }
    }

    /// Whether `site` has a dedicated adapter.
    pub fn has_adapter(&self, site: SiteId) -> bool {
        self.adapters.contains_key(&site)
    }

    /// Extract a recipe from `page`, already navigated to a URL classified as `profile`.
    ///
    /// When both the publisher adapter and the generic fallback fail, the
    /// adapter's error is returned.
    pub async fn extract(
        &self,
        page: &dyn Page,
        profile: &SiteProfile,
    ) -> Result<ExtractionResult, ExtractionError> {
        let primary_error = match self.adapters.get(&profile.id) {
            Some(adapter) => {
                log::info!("Detected {} recipe site", profile.display_name);
                match adapter.extract(page).await.and_then(complete) {
                    Ok(result) => return Ok(result),
                    Err(e) if adapter.fallback() == FallbackPolicy::Never => {
                        log::warn!("{} extraction failed: {}", adapter.name(), e);
                        return Err(e);
                    }
                    Err(e) => {
                        log::warn!(
                            "{} extraction failed ({}), trying generic scraper",
                            adapter.name(),
                            e
                        );
                        Some(e)
                    }
                }
            }
            None => {
                log::info!(
                    "No dedicated adapter for {}, attempting generic scraping",
                    profile.display_name
                );
                None
            }
        };

        match self.generic.extract(page).await.and_then(complete) {
            Ok(result) => Ok(result),
            Err(e) => Err(primary_error.unwrap_or(e)),
        }
    }
}

/// Normalize a raw result and reject it unless both sections are present.
fn complete(result: ExtractionResult) -> Result<ExtractionResult, ExtractionError> {
    let result = result.normalized();
    if result.ingredients.main.is_empty() {
        return Err(ExtractionError::NoIngredients);
    }
    if result.method.is_empty() {
        return Err(ExtractionError::NoMethod);
    }
    log::info!(
        "Extracted {} ingredients, {} method steps",
        result.ingredients.main.len(),
        result.method.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticPage;
    use crate::registry::classify;

    const GENERIC_RECIPE: &str = r#"<html><body>
        <h2>Ingredients</h2>
        <ul class="ingredients-list"><li>2 eggs</li><li>100g sugar</li></ul>
        <h2>Method</h2>
        <ol><li>Whisk the eggs.</li><li>Fold in the sugar.</li></ol>
    </body></html>"#;

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_unregistered_site_uses_generic_cascade() {
        let page = StaticPage::new(GENERIC_RECIPE);
        let result = engine()
            .extract(&page, classify("https://example.org/pavlova"))
            .await
            .unwrap();
        assert_eq!(result.ingredients.main, vec!["2 eggs", "100g sugar"]);
        assert_eq!(result.method.len(), 2);
    }

    #[tokio::test]
    async fn test_lenient_adapter_falls_back_to_generic() {
        // BBC Good Food markup is absent, the generic cascade still finds the recipe
        let page = StaticPage::new(GENERIC_RECIPE);
        let result = engine()
            .extract(&page, classify("https://www.bbcgoodfood.com/recipes/pavlova"))
            .await
            .unwrap();
        assert_eq!(result.ingredients.main, vec!["2 eggs", "100g sugar"]);
    }

    #[tokio::test]
    async fn test_strict_adapter_does_not_fall_back() {
        let page = StaticPage::new(GENERIC_RECIPE);
        let err = engine()
            .extract(&page, classify("https://cooking.nytimes.com/recipes/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoIngredients));
    }

    #[tokio::test]
    async fn test_missing_method_is_rejected() {
        let page = StaticPage::new(
            r#"<html><body><ul class="recipe-ingredients"><li>1 lemon</li></ul></body></html>"#,
        );
        let err = engine()
            .extract(&page, classify("https://example.org/lemon"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoMethod));
    }

    #[tokio::test]
    async fn test_primary_error_wins_when_fallback_also_fails() {
        // Tastemade finds the ingredients container but no steps; generic finds nothing
        let page = StaticPage::new(
            r#"<html><body><div id="recipe-ingredients"><ul><li>1 mango</li></ul></div></body></html>"#,
        );
        let err = engine()
            .extract(&page, classify("https://www.tastemade.com/recipes/mango"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoMethod));
    }

    #[test]
    fn test_adapters_registered_for_publishers() {
        let engine = engine();
        assert!(engine.has_adapter(SiteId::BbcFood));
        assert!(engine.has_adapter(SiteId::GoodTo));
        assert!(!engine.has_adapter(SiteId::FoodCom));
        assert!(!engine.has_adapter(SiteId::Generic));
    }
}
