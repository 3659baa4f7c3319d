//! Headless browser lifecycle.
//!
//! One Chromium instance serves both scraping sessions; each session owns
//! its own page. The Chrome DevTools Protocol event stream is drained by a
//! background task for the life of the browser.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::error::SessionError;

/// Owns the headless browser and its CDP event loop.
pub struct BrowserHandle {
    browser: Browser,
    event_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// Launch a headless Chromium instance.
    pub async fn launch() -> Result<Self, SessionError> {
        let config = BrowserConfig::builder()
            .window_size(1280, 720)
            .build()
            .map_err(SessionError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::BrowserLaunch(e.to_string()))?;

        let event_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser, event_task })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close the browser and join the event loop.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("browser close error: {e}");
        }
        self.event_task.abort();
        let _ = self.event_task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_launch_and_close() {
        let handle = BrowserHandle::launch().await.unwrap();
        handle.close().await;
    }
}
