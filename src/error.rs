//! Error taxonomy for the scraping pipeline.
//!
//! Only [`RunError`] aborts a run. Everything wrapped by [`ScrapeError`] is
//! scoped to a single URL and is logged and skipped by the pipeline.

/// Errors raised while talking to the DevTools endpoint or a page
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Could not attach to DevTools endpoint {endpoint}: {reason}")]
    AttachFailed { endpoint: String, reason: String },

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser connection lost: {0}")]
    ConnectionLost(String),

    #[error("Tab creation failed: {0}")]
    TabCreationError(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript execution error: {0}")]
    JavaScriptError(String),

    #[error("HTML extraction error: {0}")]
    HtmlExtractionError(String),
}

/// The DevTools endpoint could not be reached after the bounded attach sequence.
#[derive(Debug, thiserror::Error)]
#[error("Browser unavailable after {attempts} attach attempts: {last_error}")]
pub struct BrowserUnavailable {
    pub attempts: usize,
    pub last_error: String,
}

/// Page navigation failed (timeout, certificate or network error).
#[derive(Debug, thiserror::Error)]
#[error("Navigation to {url} failed: {reason}")]
pub struct NavigationError {
    pub url: String,
    pub reason: String,
}

/// Why a page could not be handed out for a URL.
#[derive(Debug, thiserror::Error)]
pub enum OpenPageError {
    /// Fatal for the run.
    #[error(transparent)]
    Unavailable(#[from] BrowserUnavailable),

    /// Scoped to the URL being opened.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The connection is alive but the tab could not be prepared.
    #[error(transparent)]
    Page(BrowserError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no ingredients found")]
    NoIngredients,

    #[error("no method steps found")]
    NoMethod,

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("page query failed: {0}")]
    Page(#[from] BrowserError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Refusing to store incomplete result for {0}")]
    Incomplete(String),
}

/// Per-URL failure. The pipeline logs these and moves on.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("Page could not be opened: {0}")]
    Page(#[from] BrowserError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Failure that ends the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    BrowserUnavailable(#[from] BrowserUnavailable),

    #[error("Cache could not be opened: {0}")]
    Cache(#[from] StorageError),

    #[error("Catalog could not be read: {0}")]
    Catalog(String),
}
