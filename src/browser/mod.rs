//! Browser automation for rendering recipe pages
//!
//! The pipeline drives an already running Chrome through its DevTools
//! endpoint. [`BrowserSession`] attaches to that endpoint (launching Chrome
//! when nothing answers), keeps the connection for the whole run, and hands
//! out one page per URL through a [`PageGuard`] that closes the page when it
//! goes out of scope.
//!
//! # Example
//!
//! ```no_run
//! use recipe_scraper::browser::BrowserSession;
//! use recipe_scraper::config::BrowserConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = BrowserSession::chrome(&BrowserConfig::default());
//! let page = session.open_page("https://example.com").await?;
//! let html = page.content().await?;
//! println!("Rendered {} bytes of HTML", html.len());
//! # Ok(())
//! # }
//! ```

pub mod chrome;
pub mod manager;
pub mod page;

use crate::error::BrowserError;
use async_trait::async_trait;

pub use chrome::ChromeEndpoint;
pub use manager::{AttachPolicy, BrowserSession, PageGuard, SessionState};
pub use page::{Page, StaticPage};

/// A remote automation endpoint that can be attached to, and started when it
/// is not running.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Address used in log lines and errors.
    fn address(&self) -> String;

    /// Open a protocol connection to the running browser.
    async fn attach(&self) -> Result<Box<dyn Connection>, BrowserError>;

    /// Start a browser process exposing the endpoint. Must not wait for it.
    fn launch(&self) -> Result<(), BrowserError>;

    /// Whether the endpoint answers right now.
    async fn is_ready(&self) -> bool;
}

/// A live protocol connection to a browser.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Open a blank page. An error means the connection itself is unusable.
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError>;
}
