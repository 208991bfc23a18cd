use crate::error::{BrowserError, NavigationError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A single browser page.
///
/// Every call may suspend on the automation protocol. Callers issue one
/// command at a time against a page; pages are never shared between URLs.
#[async_trait]
pub trait Page: Send + Sync {
    /// Load `url` and return once the DOM content has loaded.
    async fn navigate(&self, url: &str) -> Result<(), NavigationError>;

    /// Serialized DOM of the rendered page.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Wait until `selector` matches. `Ok(false)` means the wait timed out.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError>;

    /// Click the first element matching `selector` whose text contains
    /// `text` (any element when `text` is `None`). `Ok(false)` if nothing matched.
    async fn click(&self, selector: &str, text: Option<&str>) -> Result<bool, BrowserError>;

    /// Give client-side scripts time to run.
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Best-effort close. Called exactly once by the owning guard.
    fn close(&self);
}

/// A page backed by a fixed HTML snapshot.
///
/// Used to run extraction offline against saved pages, and in tests.
pub struct StaticPage {
    html: String,
    navigation_error: Option<String>,
    clicks: Mutex<Vec<String>>,
    closed: Arc<AtomicBool>,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            navigation_error: None,
            clicks: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make `navigate` fail with the given reason.
    pub fn failing_navigation(mut self, reason: &str) -> Self {
        self.navigation_error = Some(reason.to_string());
        self
    }

    /// Flag that flips to `true` once the page has been closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    /// Selectors that were clicked successfully, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn matches(&self, selector: &str, text: Option<&str>) -> Result<bool, BrowserError> {
        let sel = Selector::parse(selector)
            .map_err(|e| BrowserError::JavaScriptError(format!("bad selector {}: {:?}", selector, e)))?;
        let doc = Html::parse_document(&self.html);
        let found = doc.select(&sel).any(|el| match text {
            Some(t) => el.text().collect::<String>().contains(t),
            None => true,
        });
        Ok(found)
    }
}

#[async_trait]
impl Page for StaticPage {
    async fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        match &self.navigation_error {
            Some(reason) => Err(NavigationError {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.html.clone())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        self.matches(selector, None)
    }

    async fn click(&self, selector: &str, text: Option<&str>) -> Result<bool, BrowserError> {
        let found = self.matches(selector, text)?;
        if found {
            if let Ok(mut clicks) = self.clicks.lock() {
                clicks.push(selector.to_string());
            }
        }
        Ok(found)
    }

    async fn pause(&self, _duration: Duration) {}

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><body>
        <button class="tab">Ingredients</button>
        <button class="tab">Nutrition</button>
        <ul id="list"><li>1 egg</li></ul>
    </body></html>"#;

    #[tokio::test]
    async fn test_static_page_wait_and_click() {
        let page = StaticPage::new(HTML);
        assert!(page.wait_for("#list li", Duration::from_secs(1)).await.unwrap());
        assert!(!page.wait_for("#missing", Duration::from_secs(1)).await.unwrap());

        assert!(page.click("button.tab", Some("Nutrition")).await.unwrap());
        assert!(!page.click("button.tab", Some("Method")).await.unwrap());
        assert_eq!(page.clicks(), vec!["button.tab"]);
    }

    #[tokio::test]
    async fn test_static_page_navigation_failure() {
        let page = StaticPage::new(HTML).failing_navigation("net::ERR_TIMED_OUT");
        let err = page.navigate("https://example.com").await.unwrap_err();
        assert_eq!(err.reason, "net::ERR_TIMED_OUT");
    }

    #[test]
    fn test_close_sets_flag() {
        let page = StaticPage::new(HTML);
        let flag = page.closed_flag();
        page.close();
        assert!(flag.load(Ordering::SeqCst));
    }
}
