use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label → value pairs such as `"Calories" → "250kcal"`.
pub type Facts = BTreeMap<String, String>;

/// One entry of the base catalog. Only `source_url` matters to the scraper.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RecipeRef {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RecipeRef {
    pub fn with_url(url: &str) -> Self {
        Self {
            source_url: Some(url.to_string()),
            ..Self::default()
        }
    }

    /// The source URL, if present and not blank.
    pub fn url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
    }

    /// Human readable label for log lines.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.uuid.as_deref())
            .unwrap_or("<unnamed recipe>")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Ingredients {
    pub main: Vec<String>,
    #[serde(default)]
    pub garnishes: Vec<String>,
}

impl Ingredients {
    pub fn main(main: Vec<String>) -> Self {
        Self {
            main,
            garnishes: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub ingredients: Ingredients,
    pub method: Vec<String>,
    #[serde(default)]
    pub nutrition: Option<Facts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Facts>,
}

impl ExtractionResult {
    /// Both ingredients and method must be present before a result may be cached.
    pub fn is_valid(&self) -> bool {
        !self.ingredients.main.is_empty() && !self.method.is_empty()
    }

    /// Collapse whitespace everywhere and drop entries that end up empty.
    /// Empty fact maps become `None`.
    pub fn normalized(self) -> Self {
        Self {
            ingredients: Ingredients {
                main: clean_lines(self.ingredients.main),
                garnishes: clean_lines(self.ingredients.garnishes),
            },
            method: clean_lines(self.method),
            nutrition: self.nutrition.and_then(clean_facts),
            metadata: self.metadata.and_then(clean_facts),
        }
    }
}

/// A row of the extraction cache.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedRecord {
    pub url: String,
    pub site: String,
    pub ingredients: Ingredients,
    pub method: Vec<String>,
    pub nutrition: Option<Facts>,
    pub created_at: NaiveDateTime,
}

impl CachedRecord {
    pub fn new(url: &str, site: &str, result: &ExtractionResult) -> Self {
        Self {
            url: url.to_string(),
            site: site.to_string(),
            ingredients: result.ingredients.clone(),
            method: result.method.clone(),
            nutrition: result.nutrition.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn to_result(&self) -> ExtractionResult {
        ExtractionResult {
            ingredients: self.ingredients.clone(),
            method: self.method.clone(),
            nutrition: self.nutrition.clone(),
            metadata: None,
        }
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .iter()
        .map(|l| collapse_whitespace(l))
        .filter(|l| !l.is_empty())
        .collect()
}

fn clean_facts(facts: Facts) -> Option<Facts> {
    let cleaned: Facts = facts
        .iter()
        .map(|(k, v)| (collapse_whitespace(k), collapse_whitespace(v)))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_requires_method() {
        let result = ExtractionResult {
            ingredients: Ingredients::main(vec!["1 egg".into()]),
            method: vec![],
            nutrition: None,
            metadata: None,
        };
        assert!(!result.is_valid());
    }

    #[test]
    fn test_normalized_collapses_and_drops_blank() {
        let mut nutrition = Facts::new();
        nutrition.insert(" Fat ".into(), " 3g\n".into());
        nutrition.insert("Salt".into(), "  ".into());
        let result = ExtractionResult {
            ingredients: Ingredients::main(vec!["  200g   flour\n".into(), "   ".into()]),
            method: vec!["Mix\n\n well".into()],
            nutrition: Some(nutrition),
            metadata: Some(Facts::new()),
        }
        .normalized();

        assert_eq!(result.ingredients.main, vec!["200g flour"]);
        assert_eq!(result.method, vec!["Mix well"]);
        assert_eq!(result.nutrition.unwrap().get("Fat").unwrap(), "3g");
        assert!(result.metadata.is_none());
    }

    #[test]
    fn test_recipe_ref_blank_url_is_absent() {
        let r = RecipeRef {
            source_url: Some("   ".into()),
            ..RecipeRef::default()
        };
        assert!(r.url().is_none());
        assert_eq!(r.label(), "<unnamed recipe>");
    }

    #[test]
    fn test_recipe_ref_deserializes_catalog_entry() {
        let json = r#"{"cuisine":"Malaysian","name":"Apam Balik","source_url":"https://food.com/apam-balik","uuid":"0c6ca6e7","photo_url_large":"x"}"#;
        let r: RecipeRef = serde_json::from_str(json).unwrap();
        assert_eq!(r.url(), Some("https://food.com/apam-balik"));
        assert_eq!(r.label(), "Apam Balik");
    }
}
