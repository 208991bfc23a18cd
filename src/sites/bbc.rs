//! BBC Good Food and BBC Food.
//!
//! Both render their recipe server-side; Good Food keeps nutrition behind a
//! tab that has to be opened first. BBC Food publishes no nutrition.

use super::dom;
use super::SiteAdapter;
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Facts, Ingredients};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::time::Duration;

/// `Calories 250kcal` as printed in a nutrition list item.
static NUTRITION_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^0-9]+?)\s*([0-9.]+(?:g|kcal)?)$").unwrap());

const SECTION_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BbcVariant {
    GoodFood,
    Food,
}

impl BbcVariant {
    fn ingredients(self) -> &'static str {
        match self {
            BbcVariant::GoodFood => ".ingredients-list__item",
            BbcVariant::Food => "[data-testid=\"recipe-ingredients\"] .ssrcss-1uix24b-Stack",
        }
    }

    fn method(self) -> &'static str {
        match self {
            BbcVariant::GoodFood => ".method-steps__list-item .editor-content p",
            BbcVariant::Food => "[data-testid=\"recipe-method\"] .ssrcss-15tc05p-ListItemText p",
        }
    }
}

pub struct BbcAdapter {
    variant: BbcVariant,
    settle: Duration,
}

impl BbcAdapter {
    pub fn good_food(settle: Duration) -> Self {
        Self {
            variant: BbcVariant::GoodFood,
            settle,
        }
    }

    pub fn food(settle: Duration) -> Self {
        Self {
            variant: BbcVariant::Food,
            settle,
        }
    }
}

#[async_trait]
impl SiteAdapter for BbcAdapter {
    fn name(&self) -> &'static str {
        match self.variant {
            BbcVariant::GoodFood => "BBC Good Food",
            BbcVariant::Food => "BBC Food",
        }
    }

    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError> {
        page.pause(self.settle).await;
        if !page.wait_for(self.variant.ingredients(), SECTION_WAIT).await? {
            log::debug!("{}: ingredients section did not appear", self.name());
        }
        page.wait_for(self.variant.method(), SECTION_WAIT).await?;

        if self.variant == BbcVariant::GoodFood
            && page
                .click("button.tabbed-list__tab-button", Some("Nutrition"))
                .await?
        {
            page.wait_for(".nutrition-list__item", SECTION_WAIT).await?;
        }

        let html = page.content().await?;
        Ok(parse(self.variant, &html))
    }
}

pub fn parse(variant: BbcVariant, html: &str) -> ExtractionResult {
    let doc = Html::parse_document(html);
    let nutrition = match variant {
        BbcVariant::GoodFood => {
            let facts: Facts = dom::texts(&doc, ".nutrition-list__item")
                .iter()
                .filter_map(|item| {
                    NUTRITION_ITEM
                        .captures(item)
                        .map(|c| (c[1].trim().to_string(), c[2].to_string()))
                })
                .collect();
            (!facts.is_empty()).then_some(facts)
        }
        BbcVariant::Food => None,
    };

    ExtractionResult {
        ingredients: Ingredients::main(dom::texts(&doc, variant.ingredients())),
        method: dom::texts(&doc, variant.method()),
        nutrition,
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticPage;

    const GOOD_FOOD: &str = r#"<html><body>
        <ul>
          <li class="ingredients-list__item">400g spaghetti</li>
          <li class="ingredients-list__item">2 garlic cloves</li>
        </ul>
        <ul>
          <li class="method-steps__list-item"><div class="editor-content"><p>Boil the pasta.</p></div></li>
          <li class="method-steps__list-item"><div class="editor-content"><p>Fry the garlic.</p></div></li>
        </ul>
        <button class="tabbed-list__tab-button">Nutrition: per serving</button>
        <ul>
          <li class="nutrition-list__item">kcal 520</li>
          <li class="nutrition-list__item">fat 12g</li>
          <li class="nutrition-list__item">low in salt</li>
        </ul>
    </body></html>"#;

    #[tokio::test]
    async fn test_good_food_opens_nutrition_tab() {
        let page = StaticPage::new(GOOD_FOOD);
        let result = BbcAdapter::good_food(Duration::ZERO)
            .extract(&page)
            .await
            .unwrap();
        assert_eq!(page.clicks(), vec!["button.tabbed-list__tab-button"]);
        assert_eq!(result.ingredients.main, vec!["400g spaghetti", "2 garlic cloves"]);
        assert_eq!(result.method, vec!["Boil the pasta.", "Fry the garlic."]);

        let nutrition = result.nutrition.unwrap();
        assert_eq!(nutrition.get("kcal").map(String::as_str), Some("520"));
        assert_eq!(nutrition.get("fat").map(String::as_str), Some("12g"));
        assert_eq!(nutrition.len(), 2);
    }

    #[test]
    fn test_bbc_food_has_no_nutrition() {
        let html = r#"<html><body>
            <div data-testid="recipe-ingredients"><div class="ssrcss-1uix24b-Stack">1 onion</div></div>
            <div data-testid="recipe-method"><div class="ssrcss-15tc05p-ListItemText"><p>Chop the onion.</p></div></div>
            <ul><li class="nutrition-list__item">kcal 100</li></ul>
        </body></html>"#;
        let result = parse(BbcVariant::Food, html);
        assert_eq!(result.ingredients.main, vec!["1 onion"]);
        assert_eq!(result.method, vec!["Chop the onion."]);
        assert!(result.nutrition.is_none());
    }
}
