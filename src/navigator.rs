//! Navigation adapter over the browser-automation capability.
//!
//! [`Navigator`] is the seam between the crawl controller and the browser:
//! the controller depends only on this trait, never on a concrete automation
//! type, so the whole per-article flow can be exercised in tests against a
//! scripted implementation. [`ChromeNavigator`] is the one production
//! implementation and the only code in the crate that touches
//! `headless_chrome`.
//!
//! The adapter is a thin, fail-fast wrapper. Every call reports its own
//! failure as a [`NavError`] and nothing more; retry, skip, and abort policy
//! all live in the controller.

use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// A single navigation or interaction failure.
#[derive(Debug, Error)]
pub enum NavError {
    /// The page could not be navigated to or did not finish loading.
    #[error("navigation to {url} failed: {reason}")]
    Navigate { url: String, reason: String },

    /// No element in the current page matches the selector.
    #[error("no element matches {selector}: {reason}")]
    ElementNotFound { selector: String, reason: String },

    /// The element exists but does not carry the requested attribute.
    #[error("attribute {name} missing on {selector}")]
    AttributeMissing { selector: String, name: String },

    /// Reading from or interacting with a matched element failed.
    #[error("interaction with {selector} failed: {reason}")]
    Interaction { selector: String, reason: String },

    /// A failure in the browser process itself.
    #[error("browser error: {0}")]
    Browser(String),
}

/// Capability surface of a navigable page.
///
/// `page_source` is used exactly once, at startup, to size the initial
/// listing. `settle` is the pacing point after every navigation or click:
/// implementations wait for the page to become ready (bounded) and then
/// apply whatever courtesy delay the target site's posture requires.
#[async_trait]
pub trait Navigator {
    /// Load `url` in the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), NavError>;

    /// Full markup of the currently loaded page.
    async fn page_source(&mut self) -> Result<String, NavError>;

    /// Value of `name` on the first element matching `selector`.
    async fn attribute(&mut self, selector: &str, name: &str) -> Result<String, NavError>;

    /// Inner text of the first element matching `selector`.
    async fn text(&mut self, selector: &str) -> Result<String, NavError>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), NavError>;

    /// Go back one step in the page's history.
    async fn back(&mut self) -> Result<(), NavError>;

    /// Wait for the current page to settle before the next step.
    async fn settle(&mut self);
}

/// Production [`Navigator`] backed by a headless Chrome instance.
///
/// Launched headless with image loading disabled, the GPU off, the sandbox
/// off, and `/dev/shm` usage disabled, mirroring what the target site's
/// anti-automation posture tolerates in constrained environments.
pub struct ChromeNavigator {
    // Dropping the Browser kills the Chrome process; it must outlive the tab.
    _browser: Browser,
    tab: Arc<Tab>,
    settle_delay: Duration,
}

impl ChromeNavigator {
    /// Launch the browser and open the tab the whole crawl runs in.
    ///
    /// # Arguments
    ///
    /// * `settle_delay` - Courtesy delay applied by [`Navigator::settle`]
    ///   after the readiness wait, preserving human-like sequential pacing.
    ///
    /// # Errors
    ///
    /// Failure to launch or attach to the browser. Fatal to the crawl.
    pub fn new(settle_delay: Duration) -> Result<Self, NavError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .args(vec![
                OsStr::new("--blink-settings=imagesEnabled=false"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| NavError::Browser(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| NavError::Browser(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| NavError::Browser(e.to_string()))?;
        info!("Browser launched");

        Ok(Self {
            _browser: browser,
            tab,
            settle_delay,
        })
    }

    fn element(&self, selector: &str) -> Result<Element<'_>, NavError> {
        self.tab
            .find_element(selector)
            .map_err(|e| NavError::ElementNotFound {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Navigator for ChromeNavigator {
    async fn navigate(&mut self, url: &str) -> Result<(), NavError> {
        self.tab.navigate_to(url).map_err(|e| NavError::Navigate {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| NavError::Navigate {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, NavError> {
        self.tab
            .get_content()
            .map_err(|e| NavError::Browser(e.to_string()))
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<String, NavError> {
        let value = self
            .element(selector)?
            .get_attribute_value(name)
            .map_err(|e| NavError::Interaction {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;
        value.ok_or_else(|| NavError::AttributeMissing {
            selector: selector.to_string(),
            name: name.to_string(),
        })
    }

    async fn text(&mut self, selector: &str) -> Result<String, NavError> {
        self.element(selector)?
            .get_inner_text()
            .map_err(|e| NavError::Interaction {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn click(&mut self, selector: &str) -> Result<(), NavError> {
        self.element(selector)?
            .click()
            .map(|_| ())
            .map_err(|e| NavError::Interaction {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn back(&mut self) -> Result<(), NavError> {
        // headless_chrome exposes no history call; go through the page itself.
        self.tab
            .evaluate("window.history.back();", false)
            .map_err(|e| NavError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn settle(&mut self) {
        // Bounded condition-wait on the readiness signal first, then the
        // fixed courtesy delay that keeps the pacing human-like.
        if let Err(e) = self.tab.wait_until_navigated() {
            debug!(error = %e, "Readiness wait did not confirm navigation");
        }
        tokio::time::sleep(self.settle_delay).await;
    }
}
