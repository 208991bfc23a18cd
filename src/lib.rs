// Library interface for recipe_scraper
// The binary and the integration tests drive the pipeline through these modules

pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod sites;
