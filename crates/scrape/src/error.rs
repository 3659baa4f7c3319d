//! Error types for browser sessions and the copy client.

use thiserror::Error;

/// Errors raised by the browser-backed sessions.
///
/// Which of these abort the run is decided by call site, not variant:
/// anything returned while starting a session (launch, login) is fatal,
/// while errors from a per-item fetch are caught at the orchestration
/// boundary and resolved to an empty result.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to launch or connect to the browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Login completed but landed somewhere unexpected. Credentials or the
    /// site structure changed; retrying is pointless.
    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A required element never appeared.
    #[error("element not found: {0}")]
    MissingElement(String),

    /// In-page script evaluation failed.
    #[error("script failed: {0}")]
    Script(String),

    /// The search never settled into results or an explicit "no record".
    /// Carries a short excerpt of the results container to aid debugging
    /// flaky pages.
    #[error("timed out waiting for results for {code}; container: {snippet:?}")]
    SettleTimeout { code: String, snippet: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// Errors from the marketing-copy service client.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("copy request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("copy request network error: {0}")]
    Network(String),

    /// The service responded but the payload had no usable content.
    #[error("unusable copy response: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_timeout_display_carries_snippet() {
        let err = SessionError::SettleTimeout { code: "BP96".into(), snippet: "Loading...".into() };
        let text = err.to_string();
        assert!(text.contains("BP96"));
        assert!(text.contains("Loading..."));
    }

    #[test]
    fn test_copy_error_display() {
        let err = CopyError::Http { status: 429, body: "rate limited".into() };
        assert!(err.to_string().contains("429"));
    }
}
