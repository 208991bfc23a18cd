//! Tastemade renders its recipes client-side and hides some behind a login
//! wall. Ingredient sections are headed by `<h3>`; the "Garnishes" section is
//! kept apart from the main list.

use super::dom;
use super::SiteAdapter;
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Facts, Ingredients};
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;

const INGREDIENTS: &str = "#recipe-ingredients, [data-testid=\"recipe-ingredients\"]";
const STEPS: &str = "#recipe-preparation ol li, [data-testid=\"recipe-instructions\"] li";
const LOGIN_WALL: &str = ".space-y-3.bg-gray-100";
const NUTRITION_PANEL: &str = ".mb-5.flex.flex-col.divide-y";

const RENDER_WAIT: Duration = Duration::from_secs(30);
const PANEL_WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
pub struct TastemadeAdapter;

impl TastemadeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteAdapter for TastemadeAdapter {
    fn name(&self) -> &'static str {
        "Tastemade"
    }

    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError> {
        if !page.wait_for(INGREDIENTS, RENDER_WAIT).await? {
            if page.wait_for(LOGIN_WALL, Duration::ZERO).await? {
                log::warn!("Tastemade recipe is behind a login wall");
                return Err(ExtractionError::NoIngredients);
            }
            return Err(ExtractionError::Timeout("#recipe-ingredients".to_string()));
        }
        page.wait_for(STEPS, RENDER_WAIT).await?;

        if page.click("button", Some("Nutrition Information")).await?
            && !page.wait_for(NUTRITION_PANEL, PANEL_WAIT).await?
        {
            log::debug!("Tastemade nutrition panel did not open");
        }

        let html = page.content().await?;
        Ok(parse(&html))
    }
}

pub fn parse(html: &str) -> ExtractionResult {
    let doc = Html::parse_document(html);
    ExtractionResult {
        ingredients: ingredients(&doc),
        method: dom::first_texts(
            &doc,
            &["#recipe-preparation ol li", "[data-testid=\"recipe-instructions\"] li"],
        ),
        nutrition: nutrition(&doc),
        metadata: None,
    }
}

fn ingredients(doc: &Html) -> Ingredients {
    let mut ingredients = Ingredients::default();
    if let Some(sel) = dom::selector("#recipe-ingredients h3") {
        for header in doc.select(&sel) {
            let section = dom::element_text(header);
            let items = dom::next_element(header)
                .map(|list| dom::texts_within(list, "li"))
                .unwrap_or_default();
            if section.eq_ignore_ascii_case("garnishes") {
                ingredients.garnishes.extend(items);
            } else {
                ingredients.main.extend(items);
            }
        }
    }
    if ingredients.main.is_empty() {
        let garnishes = &ingredients.garnishes;
        ingredients.main = dom::first_texts(
            doc,
            &["#recipe-ingredients li", "[data-testid=\"recipe-ingredients\"] li"],
        )
        .into_iter()
        .filter(|item| !garnishes.contains(item))
        .collect();
    }
    ingredients
}

fn nutrition(doc: &Html) -> Option<Facts> {
    let mut facts = Facts::new();
    if let Some(sel) = dom::selector(".mb-5.flex.flex-col.divide-y > div .grid.grid-cols-2") {
        for row in doc.select(&sel) {
            let spans = dom::texts_within(row, "span");
            if let (Some(label), Some(value)) = (spans.first(), spans.last()) {
                if spans.len() > 1 {
                    facts.entry(label.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }
    if let Some(sel) = dom::selector("[data-testid=\"nutrition-modal\"] .nutrition-item") {
        for item in doc.select(&sel) {
            let label = dom::first_within(item, ".label").map(dom::element_text);
            let value = dom::first_within(item, ".value").map(dom::element_text);
            if let (Some(label), Some(value)) = (label, value) {
                facts.entry(label).or_insert(value);
            }
        }
    }
    (!facts.is_empty()).then_some(facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = r#"<html><body>
        <div id="recipe-ingredients">
          <h3>Salad</h3>
          <ul><li>1 mango</li><li>1 cucumber</li></ul>
          <h3>Garnishes</h3>
          <ul><li>Mint leaves</li></ul>
        </div>
        <div id="recipe-preparation"><ol><li>Slice everything.</li><li>Toss and garnish.</li></ol></div>
        <button>Nutrition Information</button>
        <div class="mb-5 flex flex-col divide-y">
          <div><div class="grid grid-cols-2"><span>Calories</span><span>180</span></div></div>
          <div><div class="grid grid-cols-2"><span>Sugar</span><span>22g</span></div></div>
        </div>
    </body></html>"#;

    #[tokio::test]
    async fn test_sections_and_garnishes() {
        let page = crate::browser::StaticPage::new(RECIPE);
        let result = TastemadeAdapter::new().extract(&page).await.unwrap();
        assert_eq!(result.ingredients.main, vec!["1 mango", "1 cucumber"]);
        assert_eq!(result.ingredients.garnishes, vec!["Mint leaves"]);
        assert_eq!(result.method.len(), 2);
        let nutrition = result.nutrition.unwrap();
        assert_eq!(nutrition.get("Sugar").map(String::as_str), Some("22g"));
    }

    #[tokio::test]
    async fn test_login_wall() {
        let page = crate::browser::StaticPage::new(
            r#"<html><body><div class="space-y-3 bg-gray-100">Sign in to view</div></body></html>"#,
        );
        let err = TastemadeAdapter::new().extract(&page).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoIngredients));
    }

    #[tokio::test]
    async fn test_missing_container_times_out() {
        let page = crate::browser::StaticPage::new("<html><body></body></html>");
        let err = TastemadeAdapter::new().extract(&page).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout(_)));
    }

    #[test]
    fn test_unheaded_list_leaves_out_garnishes() {
        let html = r#"<html><body>
            <div id="recipe-ingredients">
              <ul><li>1 mango</li></ul>
              <h3>Garnishes</h3>
              <ul><li>Mint leaves</li></ul>
            </div>
        </body></html>"#;
        let result = parse(html);
        assert_eq!(result.ingredients.main, vec!["1 mango"]);
        assert_eq!(result.ingredients.garnishes, vec!["Mint leaves"]);
    }

    #[test]
    fn test_alternate_layout() {
        let html = r#"<html><body>
            <ul data-testid="recipe-ingredients"><li>2 limes</li></ul>
            <ol data-testid="recipe-instructions"><li>Juice the limes.</li></ol>
        </body></html>"#;
        let result = parse(html);
        assert_eq!(result.ingredients.main, vec!["2 limes"]);
        assert_eq!(result.method, vec!["Juice the limes."]);
        assert!(result.nutrition.is_none());
    }
}
