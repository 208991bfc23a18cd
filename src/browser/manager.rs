use super::chrome::ChromeEndpoint;
use super::page::Page;
use super::{Connection, Endpoint};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, BrowserUnavailable, OpenPageError};
use std::ops::Deref;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Bounds for the attach / launch / poll sequence
#[derive(Debug, Clone)]
pub struct AttachPolicy {
    /// Top-level attach attempts
    pub attempts: usize,
    /// Readiness probes after each launch
    pub readiness_polls: usize,
    /// Delay between probes
    pub readiness_interval: Duration,
    /// Extra wait once the endpoint answers
    pub launch_grace: Duration,
}

impl Default for AttachPolicy {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for AttachPolicy {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            attempts: config.attach_attempts.max(1),
            readiness_polls: config.readiness_polls,
            readiness_interval: config.readiness_interval(),
            launch_grace: config.launch_grace(),
        }
    }
}

impl AttachPolicy {
    /// Same bounds, no waiting. For tests against fake endpoints.
    pub fn immediate() -> Self {
        Self {
            readiness_interval: Duration::ZERO,
            launch_grace: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Owns the connection to the automation endpoint for one run.
///
/// The connection is made lazily on the first [`open_page`](Self::open_page)
/// and reused for every later URL.
pub struct BrowserSession {
    endpoint: Box<dyn Endpoint>,
    policy: AttachPolicy,
    connection: Option<Box<dyn Connection>>,
    state: SessionState,
}

impl BrowserSession {
    pub fn new(endpoint: Box<dyn Endpoint>, policy: AttachPolicy) -> Self {
        Self {
            endpoint,
            policy,
            connection: None,
            state: SessionState::Disconnected,
        }
    }

    /// Session against a local Chrome DevTools endpoint.
    pub fn chrome(config: &BrowserConfig) -> Self {
        Self::new(
            Box::new(ChromeEndpoint::new(config.clone())),
            AttachPolicy::from(config),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Attach to the endpoint, launching a browser between failed attempts.
    ///
    /// Gives up with [`BrowserUnavailable`] after `policy.attempts` attaches.
    pub async fn connect(&mut self) -> Result<(), BrowserUnavailable> {
        if self.connection.is_some() {
            return Ok(());
        }

        self.state = SessionState::Connecting;
        let attempts = self.policy.attempts;
        let mut last_error = String::from("no attach attempted");

        for attempt in 1..=attempts {
            match self.endpoint.attach().await {
                Ok(connection) => {
                    log::info!("Attached to browser at {}", self.endpoint.address());
                    self.connection = Some(connection);
                    self.state = SessionState::Connected;
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("Connection attempt {} of {} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                }
            }

            if attempt == attempts {
                break;
            }

            if let Err(e) = self.endpoint.launch() {
                log::error!("{}", e);
                last_error = e.to_string();
                continue;
            }
            if self.wait_until_ready().await {
                log::info!("Browser debugging endpoint is ready");
                tokio::time::sleep(self.policy.launch_grace).await;
            } else {
                log::warn!(
                    "Browser endpoint {} did not answer after {} probes",
                    self.endpoint.address(),
                    self.policy.readiness_polls
                );
            }
        }

        self.state = SessionState::Disconnected;
        Err(BrowserUnavailable {
            attempts,
            last_error,
        })
    }

    async fn wait_until_ready(&self) -> bool {
        for _ in 0..self.policy.readiness_polls {
            if self.endpoint.is_ready().await {
                return true;
            }
            tokio::time::sleep(self.policy.readiness_interval).await;
        }
        false
    }

    fn disconnect(&mut self) {
        self.connection = None;
        self.state = SessionState::Disconnected;
    }

    /// Open a fresh page, reattaching once if the connection turns out dead.
    /// Other tab failures only concern the page being opened.
    async fn new_page(&mut self) -> Result<Box<dyn Page>, OpenPageError> {
        let mut last_error = String::new();

        for _ in 0..2 {
            self.connect().await?;
            let outcome = match &self.connection {
                Some(connection) => connection.new_page().await,
                None => continue,
            };
            match outcome {
                Ok(page) => return Ok(page),
                Err(BrowserError::ConnectionLost(reason)) => {
                    log::warn!("Browser session lost ({}), reconnecting", reason);
                    last_error = reason;
                    self.disconnect();
                }
                Err(e) => {
                    log::error!("Could not prepare a new page: {}", e);
                    return Err(OpenPageError::Page(e));
                }
            }
        }

        Err(BrowserUnavailable {
            attempts: self.policy.attempts,
            last_error,
        }
        .into())
    }

    /// Open a page and load `url` in it.
    ///
    /// The returned guard closes the page when dropped, including when
    /// navigation fails here.
    pub async fn open_page(&mut self, url: &str) -> Result<PageGuard, OpenPageError> {
        let page = PageGuard::new(self.new_page().await?);
        page.navigate(url).await?;
        Ok(page)
    }
}

/// Exclusive handle to an open page. Closes it on drop.
pub struct PageGuard {
    page: Box<dyn Page>,
}

impl PageGuard {
    pub fn new(page: Box<dyn Page>) -> Self {
        Self { page }
    }
}

impl Deref for PageGuard {
    type Target = dyn Page;

    fn deref(&self) -> &Self::Target {
        self.page.as_ref()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.page.close();
        log::debug!("Closed page after scraping");
    }
}
