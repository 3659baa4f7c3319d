//! Authenticated stock-portal session.
//!
//! One exclusive browser page drives the portal's check-stock screen:
//! log in once, then run strictly sequential per-item searches. Searches go
//! through the page's own form-submission logic rather than a direct
//! network call, because the portal's search endpoint is undocumented and
//! only reliably reachable through its client-side submission. A submission
//! may trigger a full navigation or an in-place asynchronous table refresh,
//! so the session races a navigation wait against a short timeout and then
//! polls page snapshots until the search settles.

pub mod parse;

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use scraper::Selector;
use tokio::time::Instant;

use stockbook_core::{StockConfig, StockRow};

use crate::StockSource;
use crate::browser::BrowserHandle;
use crate::error::SessionError;
use parse::{SettleState, container_snippet, settle_state};

/// Wait for login/search-page elements to appear.
const PAGE_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Overall limit for a search to reach a terminal state.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(45);

/// How long to wait for a full navigation before assuming an in-place
/// refresh.
const NAVIGATION_RACE_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One authenticated session against the stock portal.
///
/// Owns its page exclusively; operations are sequential by construction.
pub struct StockSession {
    page: Page,
    config: StockConfig,
    row_selector: Selector,
}

impl StockSession {
    /// Open a page, log in, and land on the check-stock screen.
    ///
    /// A failed login assertion is a fatal session-start error: either the
    /// credentials or the site structure changed, and retrying per item
    /// would be pointless.
    pub async fn start(handle: &BrowserHandle, config: StockConfig) -> Result<Self, SessionError> {
        let row_selector = Selector::parse(&config.results_row_selector)
            .map_err(|e| SessionError::Script(format!("invalid results row selector: {e}")))?;

        let page = handle.browser().new_page("about:blank").await?;
        page.set_user_agent(config.user_agent.as_str()).await?;

        let session = Self { page, config, row_selector };
        session.login().await?;
        session.ensure_check_stock_page().await?;
        Ok(session)
    }

    async fn login(&self) -> Result<(), SessionError> {
        self.page
            .goto(format!("{}/", self.config.base_url))
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;

        let username = self.wait_for_element(&self.config.username_selector).await?;
        username.click().await?;
        username.type_str(&self.config.username).await?;

        let password = self
            .page
            .find_element(self.config.password_selector.as_str())
            .await
            .map_err(|_| SessionError::MissingElement(self.config.password_selector.clone()))?;
        password.click().await?;
        password.type_str(&self.config.password).await?;

        let submit = self
            .page
            .find_element(self.config.submit_selector.as_str())
            .await
            .map_err(|_| SessionError::MissingElement(self.config.submit_selector.clone()))?;
        submit.click().await?;

        let _ = tokio::time::timeout(PAGE_READY_TIMEOUT, self.page.wait_for_navigation()).await;

        let url = self.current_url().await?;
        if !url.contains(&self.config.landing_marker) {
            return Err(SessionError::LoginFailed(format!(
                "expected post-login url containing {:?}, got {url:?}",
                self.config.landing_marker
            )));
        }

        tracing::info!("stock portal login ok");
        Ok(())
    }

    /// Navigate to the check-stock screen unless already there.
    async fn ensure_check_stock_page(&self) -> Result<(), SessionError> {
        let url = self.current_url().await?;
        if !url.contains(&self.config.check_stock_path) {
            self.page
                .goto(format!("{}{}", self.config.base_url, self.config.check_stock_path))
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
        }

        self.wait_for_element(&self.config.search_selector).await?;
        Ok(())
    }

    /// Search one product code and extract its variant rows.
    ///
    /// Terminal outcomes: explicit "no record" marker (empty result), rows
    /// whose leading cell starts with the uppercased code, or a timeout
    /// error carrying a snippet of the results container.
    pub async fn search(&self, code: &str) -> Result<Vec<StockRow>, SessionError> {
        self.ensure_check_stock_page().await?;

        let prefix = code.trim().to_uppercase();
        self.submit_search(code).await?;

        let started = Instant::now();
        let _ = tokio::time::timeout(NAVIGATION_RACE_TIMEOUT, self.page.wait_for_navigation()).await;

        loop {
            let html = self
                .page
                .content()
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;

            match settle_state(&html, &self.row_selector, &prefix) {
                SettleState::NoRecord => return Ok(Vec::new()),
                SettleState::Rows(rows) => return Ok(rows),
                SettleState::Pending => {}
            }

            if started.elapsed() >= SETTLE_TIMEOUT {
                return Err(SessionError::SettleTimeout {
                    code: code.to_string(),
                    snippet: container_snippet(&html),
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Drive the portal's own submission logic: set the input value,
    /// dispatch the events its scripts listen for, then submit the form.
    async fn submit_search(&self, code: &str) -> Result<(), SessionError> {
        let input = self
            .page
            .find_element(self.config.search_selector.as_str())
            .await
            .map_err(|_| SessionError::MissingElement(self.config.search_selector.clone()))?;
        input.click().await?;

        let js = submit_script(&self.config.search_selector, code)?;
        self.page
            .evaluate(js)
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str) -> Result<Element, SessionError> {
        let deadline = Instant::now() + PAGE_READY_TIMEOUT;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::MissingElement(selector.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Close the session's page. The browser stays up for other sessions.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            tracing::debug!("stock page close error: {e}");
        }
    }
}

#[async_trait]
impl StockSource for StockSession {
    async fn fetch_stock(&mut self, code: &str) -> Result<Vec<StockRow>, SessionError> {
        self.search(code).await
    }
}

/// Build the in-page submission script. Selector and value are passed
/// through JSON encoding so arbitrary codes cannot break out of the
/// script.
fn submit_script(search_selector: &str, code: &str) -> Result<String, SessionError> {
    let selector_json =
        serde_json::to_string(search_selector).map_err(|e| SessionError::Script(e.to_string()))?;
    let value_json = serde_json::to_string(code).map_err(|e| SessionError::Script(e.to_string()))?;

    Ok(format!(
        r##"(() => {{
            const input = document.querySelector({selector_json});
            if (!input) throw new Error("search input not found");
            input.value = {value_json};
            input.dispatchEvent(new Event("input", {{ bubbles: true }}));
            input.dispatchEvent(new Event("change", {{ bubbles: true }}));
            const form = input.form || document.querySelector("#control_panel");
            if (!form) throw new Error("check-stock form not found");
            if (typeof form.requestSubmit === "function") form.requestSubmit();
            else form.submit();
        }})()"##
    ))
}
