//! Marketing-copy service client.
//!
//! Talks to the OpenAI chat-completions endpoint with a JSON-object
//! response format. The client degrades rather than fails: a missing API
//! key disables the service for the whole run (logged once), and a draft
//! with blank fields is topped up from the deterministic fallback so
//! callers always receive complete copy.

pub mod fallback;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;

use stockbook_core::{MarketingCopy, ProductDetail};

use crate::CopySource;
use crate::error::CopyError;
use fallback::{fallback_copy, fill_blanks};

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";

/// Minimum spacing between requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

const SYSTEM_PROMPT: &str = "You are a product marketing copywriter for a corporate-gifts catalog. \
Respond with a single JSON object containing exactly these keys: \
\"seoTitle\" (at most 60 characters), \"productTitle\", \
\"shortDescription\" (one or two sentences), \
\"longDescription\" (one paragraph), and \
\"metaDescription\" (at most 160 characters). \
Base the copy on the provided specifications and image URL. \
Write in a confident, concrete tone and never invent specifications.";

/// Client for the copy service.
pub struct CopyClient {
    http: reqwest::Client,
    api_key: Option<String>,
    limiter: RateLimiter,
    missing_key_logged: AtomicBool,
}

impl CopyClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            limiter: RateLimiter::new(MIN_REQUEST_INTERVAL),
            missing_key_logged: AtomicBool::new(false),
        }
    }

    /// Request a copy draft for one product.
    ///
    /// `Ok(None)` means the service is unconfigured. A successful response
    /// is parsed as a JSON draft and topped up from the fallback before it
    /// is returned, so it is always complete.
    pub async fn request_copy(
        &self,
        code: &str,
        detail: &ProductDetail,
        image_url: Option<&str>,
    ) -> Result<Option<MarketingCopy>, CopyError> {
        let Some(api_key) = self.api_key.as_deref() else {
            if !self.missing_key_logged.swap(true, Ordering::Relaxed) {
                tracing::warn!("copy service key not configured; using fallback copy for all products");
            }
            return Ok(None);
        };

        self.limiter.wait().await;

        let body = json!({
            "model": MODEL,
            "temperature": 0.6,
            "max_tokens": 600,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(code, detail, image_url) },
            ],
        });

        let response = self
            .http
            .post(ENDPOINT)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CopyError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CopyError::Http { status: status.as_u16(), body });
        }

        let chat: ChatResponse =
            response.json().await.map_err(|e| CopyError::Parse(e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CopyError::Parse("response had no choices".to_string()))?;

        let draft: CopyDraft =
            serde_json::from_str(&content).map_err(|e| CopyError::Parse(e.to_string()))?;

        Ok(Some(fill_blanks(draft.into_copy(), &fallback_copy(code, detail))))
    }
}

#[async_trait]
impl CopySource for CopyClient {
    async fn generate(
        &self,
        code: &str,
        detail: &ProductDetail,
        image_url: Option<&str>,
    ) -> Result<Option<MarketingCopy>, CopyError> {
        self.request_copy(code, detail, image_url).await
    }
}

fn user_prompt(code: &str, detail: &ProductDetail, image_url: Option<&str>) -> String {
    let mut lines = vec![format!("Product code: {code}")];

    let mut push = |label: &str, value: Option<&str>| {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {value}"));
        }
    };

    push("Name", detail.display_name.as_deref());
    push("Material", detail.material.as_deref());
    push("Dimension", detail.dimension.as_deref());
    push("Weight", detail.weight.as_deref());
    push("Finish", detail.finish.as_deref());
    push("Function", detail.function.as_deref());
    let printing =
        (!detail.printing_methods.is_empty()).then(|| detail.printing_methods.join(", "));
    push("Printing methods", printing.as_deref());
    push("Image URL", image_url);

    lines.join("\n")
}

/// Service draft; every field optional so partial JSON still parses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CopyDraft {
    seo_title: Option<String>,
    product_title: Option<String>,
    short_description: Option<String>,
    long_description: Option<String>,
    meta_description: Option<String>,
}

impl CopyDraft {
    fn into_copy(self) -> MarketingCopy {
        MarketingCopy {
            seo_title: self.seo_title.unwrap_or_default(),
            product_title: self.product_title.unwrap_or_default(),
            short_description: self.short_description.unwrap_or_default(),
            long_description: self.long_description.unwrap_or_default(),
            meta_description: self.meta_description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Enforces a minimum interval between requests across callers.
struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_request: Mutex::new(None) }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
