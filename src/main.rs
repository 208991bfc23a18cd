use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use recipe_scraper::config::Config;
use recipe_scraper::error::RunError;
use recipe_scraper::pipeline::{self, Pipeline};
use std::path::Path;
use std::process::ExitCode;

const LOG_CONFIG: &str = "log4rs.yml";

fn init_logging() {
    if Path::new(LOG_CONFIG).exists() {
        if let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) {
            eprintln!("Failed to load {}: {}", LOG_CONFIG, e);
        }
        return;
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("Failed to initialize logging: {}", e);
            }
        }
        Err(e) => eprintln!("Invalid logging configuration: {}", e),
    }
}

async fn run(cfg: &Config) -> Result<(), RunError> {
    let recipes = pipeline::load_catalog(&cfg.pipeline.input_path)?;
    let mut pipeline = Pipeline::from_config(cfg)?;
    let report = pipeline.run(&recipes).await?;

    for skipped in &report.skipped {
        log::warn!(
            "Skipped {} ({}): {}",
            skipped.recipe,
            skipped.url.as_deref().unwrap_or("no URL"),
            skipped.reason
        );
    }
    let location = pipeline
        .cache()
        .path()
        .unwrap_or(cfg.cache.database_path.as_path())
        .display()
        .to_string();
    log::info!(
        "Recipe data saved to {} ({} recipes cached)",
        location,
        pipeline.cache().len().unwrap_or(0)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cfg = Config::load();
    log::info!("Browser endpoint: {}", cfg.browser.endpoint_url());
    log::info!("Recipe cache: {}", cfg.cache.database_path.display());

    match run(&cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Scraping failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
