//! Sequential scrape of a recipe catalog.
//!
//! Each source URL is looked up in the cache first and only rendered in the
//! browser on a miss. Failures are scoped to their URL and logged; the run
//! only stops early when the browser cannot be reached at all.

use crate::browser::BrowserSession;
use crate::cache::ExtractionCache;
use crate::config::Config;
use crate::error::{BrowserUnavailable, OpenPageError, RunError, ScrapeError};
use crate::models::{CachedRecord, ExtractionResult, RecipeRef};
use crate::registry;
use crate::sites::ExtractionEngine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The catalog file is either a bare array of recipes or `{"recipes": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Catalog {
    List(Vec<RecipeRef>),
    Wrapped { recipes: Vec<RecipeRef> },
}

/// Read the recipe catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Vec<RecipeRef>, RunError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RunError::Catalog(format!("{}: {}", path.display(), e)))?;
    let catalog: Catalog = serde_json::from_str(&raw)
        .map_err(|e| RunError::Catalog(format!("{}: {}", path.display(), e)))?;
    let recipes = match catalog {
        Catalog::List(recipes) | Catalog::Wrapped { recipes } => recipes,
    };
    log::info!("Loaded {} recipes from {}", recipes.len(), path.display());
    Ok(recipes)
}

/// Where a result came from.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cached,
    Scraped,
}

#[derive(Debug, Serialize, Clone)]
pub struct ScrapedRecipe {
    pub url: String,
    pub site: String,
    pub origin: Origin,
    pub result: ExtractionResult,
}

#[derive(Debug, Serialize, Clone)]
pub struct Skipped {
    pub recipe: String,
    pub url: Option<String>,
    pub reason: String,
}

/// Outcome of a run, in catalog order.
#[derive(Debug, Default, Serialize, Clone)]
pub struct RunReport {
    pub results: Vec<ScrapedRecipe>,
    pub skipped: Vec<Skipped>,
}

impl RunReport {
    pub fn count(&self, origin: Origin) -> usize {
        self.results.iter().filter(|r| r.origin == origin).count()
    }

    fn skip(&mut self, recipe: &RecipeRef, reason: String) {
        self.skipped.push(Skipped {
            recipe: recipe.label().to_string(),
            url: recipe.url().map(str::to_string),
            reason,
        });
    }
}

pub struct Pipeline {
    session: BrowserSession,
    cache: ExtractionCache,
    engine: ExtractionEngine,
    registered_sites_only: bool,
}

impl Pipeline {
    pub fn new(session: BrowserSession, cache: ExtractionCache, engine: ExtractionEngine) -> Self {
        Self {
            session,
            cache,
            engine,
            registered_sites_only: false,
        }
    }

    /// Chrome session, on-disk cache and engine as configured.
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        let cache = ExtractionCache::open(&config.cache.database_path)?;
        let pipeline = Self::new(
            BrowserSession::chrome(&config.browser),
            cache,
            ExtractionEngine::new(config.pipeline.settle_delay()),
        );
        Ok(pipeline.registered_sites_only(config.pipeline.registered_sites_only))
    }

    /// Skip catalog entries whose URL matches no registered publisher.
    pub fn registered_sites_only(mut self, enabled: bool) -> Self {
        self.registered_sites_only = enabled;
        self
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Process every catalog entry in order.
    ///
    /// Returns early only with [`RunError::BrowserUnavailable`]; records
    /// written before that point stay in the cache.
    pub async fn run(&mut self, recipes: &[RecipeRef]) -> Result<RunReport, RunError> {
        let mut report = RunReport::default();
        log::info!("Processing {} recipes", recipes.len());

        for recipe in recipes {
            let Some(url) = recipe.url() else {
                log::warn!("Skipping {}: no source URL", recipe.label());
                report.skip(recipe, "missing source URL".to_string());
                continue;
            };
            if self.registered_sites_only && !registry::is_registered(url) {
                log::info!("Skipping {}: {} is not a registered site", recipe.label(), url);
                report.skip(recipe, "unregistered site".to_string());
                continue;
            }

            log::info!("Processing recipe: {}", recipe.label());
            match self.process(url).await? {
                Ok(scraped) => report.results.push(scraped),
                Err(e) => {
                    log::error!("Error processing {}: {}", url, e);
                    report.skip(recipe, e.to_string());
                }
            }
        }

        log::info!(
            "Finished: {} scraped, {} from cache, {} skipped",
            report.count(Origin::Scraped),
            report.count(Origin::Cached),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Produce the recipe for one URL, from the cache or the browser.
    ///
    /// The outer error ends the run; the inner one only concerns `url`.
    pub async fn process(
        &mut self,
        url: &str,
    ) -> Result<Result<ScrapedRecipe, ScrapeError>, BrowserUnavailable> {
        match self.cache.lookup(url) {
            Ok(Some(record)) => {
                log::info!("Using cached recipe for {}", url);
                return Ok(Ok(ScrapedRecipe {
                    url: url.to_string(),
                    site: record.site.clone(),
                    origin: Origin::Cached,
                    result: record.to_result(),
                }));
            }
            Ok(None) => {}
            Err(e) => log::warn!("Cache lookup failed for {}, scraping instead: {}", url, e),
        }

        let profile = registry::classify(url);
        log::info!("Scraping {} ({})", url, profile.display_name);

        let page = match self.session.open_page(url).await {
            Ok(page) => page,
            Err(OpenPageError::Unavailable(e)) => return Err(e),
            Err(OpenPageError::Navigation(e)) => return Ok(Err(e.into())),
            Err(OpenPageError::Page(e)) => return Ok(Err(e.into())),
        };
        let extracted = self.engine.extract(&*page, profile).await;
        drop(page);

        let result = match extracted {
            Ok(result) => result,
            Err(e) => return Ok(Err(e.into())),
        };

        let record = CachedRecord::new(url, profile.display_name, &result);
        if let Err(e) = self.cache.upsert(&record) {
            return Ok(Err(e.into()));
        }
        log::info!("Saved recipe for {}", url);

        Ok(Ok(ScrapedRecipe {
            url: url.to_string(),
            site: profile.display_name.to_string(),
            origin: Origin::Scraped,
            result,
        }))
    }
}
