//! Best-effort extraction for sites without a dedicated adapter.
//!
//! Each section is found by an ordered cascade of strategies, from the most
//! structured markup down to regular expressions over the page text. The
//! first strategy that yields anything (after filtering) wins.

use super::dom::{self, AfterHeading};
use super::SiteAdapter;
use crate::browser::Page;
use crate::error::ExtractionError;
use crate::models::{ExtractionResult, Facts, Ingredients};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::time::Duration;

static UNIT_TOGGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(us|metric)$").unwrap());
static EQUIPMENT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(you'll need|equipment|utensils):").unwrap());
static INSTRUCTION_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)method|direction|step").unwrap());
static EQUIPMENT_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(tins?|pans?|bowls?|paper)\b").unwrap());
static NAVIGATION_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(recipes?|desserts|snacks)\b").unwrap());
static QUANTITY_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d+(\.\d+)?\s*(cups?|tbsp|tsp|oz|g|ml|pounds?|kg)\b").unwrap()
});

static INGREDIENTS_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)ingredients:?(.*?)(?:directions|method|steps|preparation|instructions|you'll need|equipment|$)").unwrap()
});
static METHOD_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:directions|method|steps|preparation|instructions):?(.*?)(?:nutrition|notes|tips|$)").unwrap()
});
static STEP_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.|(?:\r?\n){2,}").unwrap());
static NUTRITION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nutrition").unwrap());

/// `Calories: 250kcal`, matched anywhere in a text. The unit stays on the
/// figure's line.
static LABELLED_FACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z ()/-]*?)\s*:\s*(\d+(?:\.\d+)?[ \t]*(?:[A-Za-z]+|%)?)").unwrap()
});
/// `Calories 250kcal`, as a whole line.
static SPACED_FACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z ()/-]*?)\s+(\d+(?:\.\d+)?[ \t]*(?:[A-Za-z]+|%)?)$").unwrap()
});

const TAB_PANELS: &[&str] = &["#metric p", "#us p", ".tab-pane.active p", ".tab-content p"];

const INGREDIENT_LISTS: &[&str] = &[
    "ul.recipe-ingredients li",
    "ul.ingredients-list li",
    ".recipe-ingredients li",
    ".ingredients-list li",
    "[itemprop=\"recipeIngredient\"]",
];

const METHOD_HEADINGS: &[&str] = &["Method", "Steps", "Directions", "Preparation"];

pub struct GenericAdapter {
    settle: Duration,
}

impl GenericAdapter {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl SiteAdapter for GenericAdapter {
    fn name(&self) -> &'static str {
        "Generic"
    }

    async fn extract(&self, page: &dyn Page) -> Result<ExtractionResult, ExtractionError> {
        page.pause(self.settle).await;

        let first = page.content().await?;
        let tabbed = tab_panel_ingredients(&Html::parse_document(&first));
        if !tabbed.is_empty() {
            log::debug!("Found {} ingredients in tab panels", tabbed.len());
            return Ok(parse(&first, tabbed));
        }

        // Unit toggles hide the list until one is chosen
        if page.click("button", Some("Metric")).await? {
            log::debug!("Switched ingredient units to metric");
            page.pause(Duration::from_millis(500)).await;
        }
        let html = page.content().await?;
        Ok(parse(&html, Vec::new()))
    }
}

/// Run the cascades over a rendered page. `tabbed` holds ingredients already
/// found in tab panels, which take precedence over every other strategy.
pub fn parse(html: &str, tabbed: Vec<String>) -> ExtractionResult {
    let doc = Html::parse_document(html);
    let main = if tabbed.is_empty() {
        extract_ingredients(&doc)
    } else {
        tabbed
    };
    ExtractionResult {
        ingredients: Ingredients::main(main),
        method: extract_method(&doc),
        nutrition: extract_nutrition(&doc),
        metadata: None,
    }
}

/// Applied to ingredient lines from every strategy.
fn is_ingredient_line(line: &str) -> bool {
    line.chars().count() > 1
        && !UNIT_TOGGLE.is_match(line)
        && !EQUIPMENT_HEADER.is_match(line)
        && !INSTRUCTION_WORD.is_match(line)
}

/// List markup also picks up equipment and navigation entries.
fn is_listed_ingredient(line: &str) -> bool {
    is_ingredient_line(line) && !EQUIPMENT_ITEM.is_match(line) && !NAVIGATION_WORD.is_match(line)
}

fn is_method_step(step: &str) -> bool {
    !step.is_empty() && !QUANTITY_STEP.is_match(step)
}

fn keep(lines: Vec<String>, pred: fn(&str) -> bool) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| pred(l))
        .collect()
}

fn tab_panel_ingredients(doc: &Html) -> Vec<String> {
    TAB_PANELS
        .iter()
        .map(|css| keep(dom::texts(doc, css), is_ingredient_line))
        .find(|lines| !lines.is_empty())
        .unwrap_or_default()
}

fn extract_ingredients(doc: &Html) -> Vec<String> {
    let listed = listed_ingredient_candidates(doc)
        .into_iter()
        .map(|lines| keep(lines, is_listed_ingredient))
        .find(|lines| !lines.is_empty());
    if let Some(lines) = listed {
        log::debug!("Found {} ingredients in list markup", lines.len());
        return lines;
    }

    let text = dom::body_text(doc);
    let lines = INGREDIENTS_BLOCK
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|block| {
            block
                .as_str()
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| is_ingredient_line(l))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if !lines.is_empty() {
        log::debug!("Found {} ingredients in page text", lines.len());
    }
    lines
}

fn listed_ingredient_candidates(doc: &Html) -> Vec<Vec<String>> {
    let mut candidates: Vec<Vec<String>> =
        INGREDIENT_LISTS.iter().map(|css| dom::texts(doc, css)).collect();
    candidates.push(dom::items_after_heading(
        doc,
        AfterHeading {
            tags: &["h2", "h3", "h4"],
            label: "Ingredients",
            sibling: "ul",
            first_only: true,
            items: Some("li"),
        },
    ));
    candidates.push(dom::items_in_classed(doc, &["div", "section"], "ingredient", "li"));
    candidates.push(dom::items_after_heading(
        doc,
        AfterHeading {
            tags: &["p", "strong", "b"],
            label: "Ingredients",
            sibling: "ul",
            first_only: true,
            items: Some("li"),
        },
    ));
    candidates
}

fn extract_method(doc: &Html) -> Vec<String> {
    let mut candidates: Vec<Vec<String>> = METHOD_HEADINGS
        .iter()
        .map(|label| {
            dom::items_after_heading(
                doc,
                AfterHeading {
                    tags: &["h2", "h3"],
                    label: *label,
                    sibling: "ol",
                    first_only: false,
                    items: Some("li"),
                },
            )
        })
        .collect();
    for needle in ["method", "direction", "preparation"] {
        candidates.push(dom::items_in_classed(doc, &["div", "section"], needle, "li"));
    }
    for label in &METHOD_HEADINGS[..3] {
        candidates.push(dom::items_after_heading(
            doc,
            AfterHeading {
                tags: &["h2", "h3"],
                label: *label,
                sibling: "p",
                first_only: false,
                items: None,
            },
        ));
    }

    let structured = candidates
        .into_iter()
        .map(|steps| keep(steps, is_method_step))
        .find(|steps| !steps.is_empty());
    if let Some(steps) = structured {
        return steps;
    }

    let text = dom::body_text(doc);
    METHOD_BLOCK
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|block| {
            STEP_SPLIT
                .split(block.as_str())
                .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|s| is_method_step(s))
                .collect()
        })
        .unwrap_or_default()
}

fn extract_nutrition(doc: &Html) -> Option<Facts> {
    let table = nutrition_table(doc);
    if !table.is_empty() {
        return Some(table);
    }

    let mut listed = Facts::new();
    let items = dom::items_in_classed(doc, &["div", "section"], "nutrition", "li")
        .into_iter()
        .chain(dom::texts(doc, "[class*=\"nutrition-info\"]"));
    for item in items {
        insert_facts(&mut listed, &item);
    }
    if !listed.is_empty() {
        return Some(listed);
    }

    let mut text_facts = Facts::new();
    let paragraphs = dom::items_after_heading(
        doc,
        AfterHeading {
            tags: &["h2", "h3"],
            label: "Nutrition",
            sibling: "p",
            first_only: false,
            items: None,
        },
    );
    for p in paragraphs {
        insert_facts(&mut text_facts, &p);
    }
    if text_facts.is_empty() {
        let text = dom::body_text(doc);
        if let Some(marker) = NUTRITION_MARKER.find(&text) {
            for cap in LABELLED_FACT.captures_iter(&text[marker.end()..]) {
                text_facts
                    .entry(cap[1].trim().to_string())
                    .or_insert_with(|| cap[2].trim().to_string());
            }
        }
    }
    (!text_facts.is_empty()).then_some(text_facts)
}

fn nutrition_table(doc: &Html) -> Facts {
    let mut facts = Facts::new();
    for heading in dom::headings(doc, &["h2", "h3"], "Nutrition") {
        for table in dom::following_siblings(heading, "table") {
            let Some(row_sel) = dom::selector("tr") else {
                continue;
            };
            for row in table.select(&row_sel) {
                let cells = dom::texts_within(row, "th, td");
                match cells.as_slice() {
                    [label, value, ..] => {
                        facts.entry(label.clone()).or_insert_with(|| value.clone());
                    }
                    [single] => insert_facts(&mut facts, single),
                    [] => {}
                }
            }
        }
    }
    facts
}

/// Parse `label: value` pairs out of a text, or a single `label value` line.
pub(crate) fn insert_facts(facts: &mut Facts, text: &str) {
    let mut found = false;
    for cap in LABELLED_FACT.captures_iter(text) {
        found = true;
        facts
            .entry(cap[1].trim().to_string())
            .or_insert_with(|| cap[2].trim().to_string());
    }
    if !found {
        if let Some(cap) = SPACED_FACT.captures(text.trim()) {
            facts
                .entry(cap[1].trim().to_string())
                .or_insert_with(|| cap[2].trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticPage;

    #[test]
    fn test_tab_panel_beats_list_markup() {
        let html = r#"<html><body>
            <div id="metric"><p>200g flour</p><p>Metric</p><p>2 eggs</p></div>
            <ul class="recipe-ingredients"><li>1 cup flour</li></ul>
            <h2>Method</h2><ol><li>Mix.</li></ol>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let tabbed = tab_panel_ingredients(&doc);
        assert_eq!(tabbed, vec!["200g flour", "2 eggs"]);
        let result = parse(html, tabbed);
        assert_eq!(result.ingredients.main, vec!["200g flour", "2 eggs"]);
    }

    #[test]
    fn test_list_stage_drops_equipment_and_instructions() {
        let html = r#"<html><body><ul class="ingredients-list">
            <li>200g butter</li>
            <li>20cm cake tin</li>
            <li>Baking paper</li>
            <li>See method below</li>
            <li>1 tsp baking powder</li>
            <li>x</li>
        </ul></body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_ingredients(&doc),
            vec!["200g butter", "1 tsp baking powder"]
        );
    }

    #[test]
    fn test_ingredients_from_page_text() {
        let html = r#"<html><body>
            <div>Ingredients:<br>3 ripe bananas<br>US<br>1 tbsp honey<br></div>
            <div>Method: mash and serve.</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_ingredients(&doc), vec!["3 ripe bananas", "1 tbsp honey"]);
    }

    #[test]
    fn test_method_rejects_quantity_lines() {
        let html = r#"<html><body>
            <h2>Directions</h2>
            <ol><li>2 cups stock</li><li>Simmer for 10 minutes.</li><li>2 garlic cloves go in last.</li></ol>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_method(&doc),
            vec!["Simmer for 10 minutes.", "2 garlic cloves go in last."]
        );
    }

    #[test]
    fn test_method_from_paragraphs_after_heading() {
        let html = r#"<html><body>
            <h3>Steps</h3><p>Heat the oil.</p><p>Fry the onions.</p>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_method(&doc), vec!["Heat the oil.", "Fry the onions."]);
    }

    #[test]
    fn test_method_from_numbered_text() {
        let html = r#"<html><body>
            <div>Instructions: 1. Boil the water. 2. Add the pasta. 3. Drain.</div>
            <div>Notes: best fresh.</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            extract_method(&doc),
            vec!["Boil the water.", "Add the pasta.", "Drain."]
        );
    }

    #[test]
    fn test_nutrition_table_after_heading() {
        let html = r#"<html><body>
            <h2>Nutrition</h2>
            <table><tr><td>Calories</td><td>250kcal</td></tr><tr><td>Fat</td><td>12g</td></tr></table>
        </body></html>"#;
        let facts = extract_nutrition(&Html::parse_document(html)).unwrap();
        assert_eq!(facts.get("Calories").map(String::as_str), Some("250kcal"));
        assert_eq!(facts.get("Fat").map(String::as_str), Some("12g"));
    }

    #[test]
    fn test_nutrition_list_items() {
        let html = r#"<html><body><section class="recipe-nutrition"><ul>
            <li>Protein: 8g</li><li>Sugar 3.5g</li>
        </ul></section></body></html>"#;
        let facts = extract_nutrition(&Html::parse_document(html)).unwrap();
        assert_eq!(facts.get("Protein").map(String::as_str), Some("8g"));
        assert_eq!(facts.get("Sugar").map(String::as_str), Some("3.5g"));
    }

    #[test]
    fn test_page_text_facts_stop_at_line_end() {
        let html = r#"<html><body>
            <div>Nutrition</div><div>Calories: 250</div><div>Protein: 8g</div>
        </body></html>"#;
        let facts = extract_nutrition(&Html::parse_document(html)).unwrap();
        assert_eq!(facts.get("Calories").map(String::as_str), Some("250"));
        assert_eq!(facts.get("Protein").map(String::as_str), Some("8g"));
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn test_no_nutrition_is_none() {
        let html = "<html><body><p>Just a story.</p></body></html>";
        assert!(extract_nutrition(&Html::parse_document(html)).is_none());
    }

    #[tokio::test]
    async fn test_food_com_page() {
        let html = r#"<html><body>
            <h1>Apam Balik</h1>
            <section class="layout__item ingredients">
              <h2>Ingredients</h2>
              <ul>
                <li>200 g flour</li>
                <li>100 g sugar</li>
                <li>2 eggs</li>
                <li>1 tsp baking soda</li>
                <li>50 g peanuts</li>
              </ul>
            </section>
            <section class="layout__item directions">
              <h2>Directions</h2>
              <ol>
                <li>Mix the dry ingredients.</li>
                <li>Whisk in the eggs.</li>
                <li>Cook in a hot pan.</li>
                <li>Fill with peanuts and fold.</li>
              </ol>
            </section>
        </body></html>"#;
        let page = StaticPage::new(html);
        let result = GenericAdapter::new(Duration::ZERO).extract(&page).await.unwrap();
        assert_eq!(result.ingredients.main.len(), 5);
        assert_eq!(result.method.len(), 4);
        assert_eq!(result.method[0], "Mix the dry ingredients.");
        assert!(result.nutrition.is_none());
    }

    #[tokio::test]
    async fn test_metric_toggle_clicked_when_no_tab_panel() {
        let html = r#"<html><body>
            <button>US</button><button>Metric</button>
            <ul class="ingredients-list"><li>250ml milk</li></ul>
            <h2>Method</h2><ol><li>Warm the milk.</li></ol>
        </body></html>"#;
        let page = StaticPage::new(html);
        let result = GenericAdapter::new(Duration::ZERO).extract(&page).await.unwrap();
        assert_eq!(page.clicks(), vec!["button"]);
        assert_eq!(result.ingredients.main, vec!["250ml milk"]);
    }
}
