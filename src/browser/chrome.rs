//! Chrome DevTools implementation of the browser seams.
//!
//! `headless_chrome` is a blocking client, so every protocol call is moved
//! onto the blocking thread pool.

use super::page::Page;
use super::{Connection, Endpoint};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, NavigationError};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Security;
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use std::process::{Command, Stdio};
use tokio::runtime::RuntimeFlavor;
use std::sync::Arc;
use std::time::Duration;

#[derive(Deserialize, Debug)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// The DevTools endpoint of a long-lived local Chrome.
pub struct ChromeEndpoint {
    config: BrowserConfig,
    http: reqwest::Client,
}

impl ChromeEndpoint {
    pub fn new(config: BrowserConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    async fn version_info(&self) -> Result<VersionInfo, reqwest::Error> {
        let url = format!("{}/json/version", self.config.endpoint_url());
        self.http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<VersionInfo>()
            .await
    }

    fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.config.port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--ignore-certificate-errors".to_string(),
            format!("--user-data-dir={}", self.config.user_data_dir.display()),
        ];
        if self.config.headless {
            args.push("--headless=new".to_string());
        }
        args
    }
}

#[async_trait]
impl Endpoint for ChromeEndpoint {
    fn address(&self) -> String {
        self.config.endpoint_url()
    }

    async fn attach(&self) -> Result<Box<dyn Connection>, BrowserError> {
        let attach_failed = |reason: String| BrowserError::AttachFailed {
            endpoint: self.address(),
            reason,
        };

        let info = self
            .version_info()
            .await
            .map_err(|e| attach_failed(e.to_string()))?;
        log::debug!("DevTools websocket: {}", info.web_socket_debugger_url);

        let browser = tokio::task::spawn_blocking(move || Browser::connect(info.web_socket_debugger_url))
            .await
            .map_err(|e| attach_failed(e.to_string()))?
            .map_err(|e| attach_failed(e.to_string()))?;

        Ok(Box::new(ChromeConnection {
            browser: Arc::new(browser),
            navigation_timeout: self.config.navigation_timeout(),
        }))
    }

    fn launch(&self) -> Result<(), BrowserError> {
        let executable = match &self.config.chrome_path {
            Some(path) => path.clone(),
            None => headless_chrome::browser::default_executable()
                .map_err(BrowserError::LaunchFailed)?,
        };
        log::info!(
            "Launching {} with remote debugging on port {}",
            executable.display(),
            self.config.port
        );

        let mut command = Command::new(&executable);
        command
            .args(self.launch_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group, so Chrome outlives this process
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        // Dropping the child handle neither waits for nor kills the process
        command
            .spawn()
            .map(|_child| ())
            .map_err(|e| BrowserError::LaunchFailed(format!("{}: {}", executable.display(), e)))
    }

    async fn is_ready(&self) -> bool {
        self.version_info().await.is_ok()
    }
}

struct ChromeConnection {
    browser: Arc<Browser>,
    navigation_timeout: Duration,
}

#[async_trait]
impl Connection for ChromeConnection {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        let browser = self.browser.clone();
        let timeout = self.navigation_timeout;

        let tab = tokio::task::spawn_blocking(move || -> Result<Arc<Tab>, BrowserError> {
            let tab = browser
                .new_tab()
                .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?;
            tab.set_default_timeout(timeout);
            tab.call_method(Security::SetIgnoreCertificateErrors { ignore: true })
                .map_err(|e| BrowserError::TabCreationError(e.to_string()))?;
            Ok(tab)
        })
        .await
        .map_err(|e| BrowserError::TabCreationError(e.to_string()))??;

        Ok(Box::new(ChromePage { tab }))
    }
}

struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    async fn blocking<T, F>(&self, op: F) -> Result<T, BrowserError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Tab>) -> Result<T, BrowserError> + Send + 'static,
    {
        let tab = self.tab.clone();
        tokio::task::spawn_blocking(move || op(tab))
            .await
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?
    }
}

#[async_trait]
impl Page for ChromePage {
    async fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        log::info!("Browser navigating to: {}", url);
        let target = url.to_string();
        self.blocking(move |tab| {
            tab.navigate_to(&target)
                .and_then(|t| t.wait_until_navigated())
                .map(|_| ())
                .map_err(|e| BrowserError::HtmlExtractionError(e.to_string()))
        })
        .await
        .map_err(|e| NavigationError {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.blocking(|tab| {
            tab.get_content()
                .map_err(|e| BrowserError::HtmlExtractionError(e.to_string()))
        })
        .await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, BrowserError> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            Ok(tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .is_ok())
        })
        .await
    }

    async fn click(&self, selector: &str, text: Option<&str>) -> Result<bool, BrowserError> {
        let script = click_script(selector, text);
        self.blocking(move |tab| {
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| BrowserError::JavaScriptError(format!("Click failed: {}", e)))?;
            Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
        })
        .await
    }

    fn close(&self) {
        let close = || {
            if let Err(e) = self.tab.close(false) {
                log::debug!("Closing tab failed: {}", e);
            }
        };
        // block_in_place is only allowed on the multi-threaded runtime
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(close)
            }
            _ => close(),
        }
    }
}

fn click_script(selector: &str, text: Option<&str>) -> String {
    let selector = serde_json::Value::String(selector.to_string());
    let text = text
        .map(|t| serde_json::Value::String(t.to_string()))
        .unwrap_or(serde_json::Value::Null);
    format!(
        r#"(() => {{
            const needle = {text};
            const el = Array.from(document.querySelectorAll({selector}))
                .find(e => needle === null || (e.textContent || '').includes(needle));
            if (!el) return false;
            el.click();
            return true;
        }})()"#
    )
}
