//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (STOCKBOOK_*)
//! 2. TOML config file (if STOCKBOOK_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Session constructors never read the environment themselves; they take
//! the typed [`StockConfig`]/[`DetailConfig`] structs produced here, so
//! every required key is checked once at startup and a missing credential
//! fails fast instead of surfacing mid-scrape.

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Stock portal base URL, e.g. `https://portal.example.com`.
    ///
    /// Set via STOCKBOOK_STOCK_BASE_URL. Required.
    #[serde(default)]
    pub stock_base_url: Option<String>,

    /// Path of the check-stock page on the portal.
    ///
    /// Set via STOCKBOOK_STOCK_PATH. Required.
    #[serde(default)]
    pub stock_path: Option<String>,

    /// Portal login credentials.
    ///
    /// Set via STOCKBOOK_STOCK_USERNAME / STOCKBOOK_STOCK_PASSWORD. Required.
    #[serde(default)]
    pub stock_username: Option<String>,

    #[serde(default)]
    pub stock_password: Option<String>,

    /// CSS selector of the check-stock search input.
    ///
    /// Set via STOCKBOOK_STOCK_SEARCH_SELECTOR. Required.
    #[serde(default)]
    pub stock_search_selector: Option<String>,

    /// CSS selector matching one result row in the stock table.
    ///
    /// Set via STOCKBOOK_STOCK_RESULTS_ROW_SELECTOR. Required.
    #[serde(default)]
    pub stock_results_row_selector: Option<String>,

    /// URL fragment the portal lands on after a successful login.
    #[serde(default = "default_landing_marker")]
    pub stock_landing_marker: String,

    /// Login form selectors. Defaults match the portal's current markup.
    #[serde(default = "default_username_selector")]
    pub stock_username_selector: String,

    #[serde(default = "default_password_selector")]
    pub stock_password_selector: String,

    #[serde(default = "default_submit_selector")]
    pub stock_submit_selector: String,

    /// Detail (specification) site base URL.
    ///
    /// Set via STOCKBOOK_DETAIL_BASE_URL. Required.
    #[serde(default)]
    pub detail_base_url: Option<String>,

    /// Copy-service credential. Optional: without it, copy generation is
    /// skipped and fallback text is used.
    ///
    /// Set via STOCKBOOK_OPENAI_API_KEY.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Path to the JSON cache file.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Path to the product-list CSV (must have a `code` column).
    #[serde(default = "default_products_path")]
    pub products_path: PathBuf,

    /// Directory the CSV/JSON exports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// User-Agent applied to every browser page and HTTP request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Everything the stock session needs, with required keys resolved.
#[derive(Debug, Clone)]
pub struct StockConfig {
    pub base_url: String,
    pub check_stock_path: String,
    pub username: String,
    pub password: String,
    pub search_selector: String,
    pub results_row_selector: String,
    pub landing_marker: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub user_agent: String,
}

/// Detail-session settings. The site is public; only its origin is needed.
#[derive(Debug, Clone)]
pub struct DetailConfig {
    pub base_url: String,
    pub user_agent: String,
}

fn default_landing_marker() -> String {
    "calculator.php".into()
}

fn default_username_selector() -> String {
    "#UserName1".into()
}

fn default_password_selector() -> String {
    "#Pass1".into()
}

fn default_submit_selector() -> String {
    "#Submit1".into()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./stockbook-cache.json")
}

fn default_products_path() -> PathBuf {
    PathBuf::from("./products.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stock_base_url: None,
            stock_path: None,
            stock_username: None,
            stock_password: None,
            stock_search_selector: None,
            stock_results_row_selector: None,
            stock_landing_marker: default_landing_marker(),
            stock_username_selector: default_username_selector(),
            stock_password_selector: default_password_selector(),
            stock_submit_selector: default_submit_selector(),
            detail_base_url: None,
            openai_api_key: None,
            cache_path: default_cache_path(),
            products_path: default_products_path(),
            output_dir: default_output_dir(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, environment
    /// values cannot be parsed, or validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STOCKBOOK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::prefixed("STOCKBOOK_").map(|key| key.as_str().to_lowercase().into()));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Resolve the stock-session config, failing on any missing key.
    pub fn stock(&self) -> Result<StockConfig, ConfigError> {
        Ok(StockConfig {
            base_url: required(&self.stock_base_url, "stock_base_url", "STOCKBOOK_STOCK_BASE_URL")?,
            check_stock_path: required(&self.stock_path, "stock_path", "STOCKBOOK_STOCK_PATH")?,
            username: required(&self.stock_username, "stock_username", "STOCKBOOK_STOCK_USERNAME")?,
            password: required(&self.stock_password, "stock_password", "STOCKBOOK_STOCK_PASSWORD")?,
            search_selector: required(
                &self.stock_search_selector,
                "stock_search_selector",
                "STOCKBOOK_STOCK_SEARCH_SELECTOR",
            )?,
            results_row_selector: required(
                &self.stock_results_row_selector,
                "stock_results_row_selector",
                "STOCKBOOK_STOCK_RESULTS_ROW_SELECTOR",
            )?,
            landing_marker: self.stock_landing_marker.clone(),
            username_selector: self.stock_username_selector.clone(),
            password_selector: self.stock_password_selector.clone(),
            submit_selector: self.stock_submit_selector.clone(),
            user_agent: self.user_agent.clone(),
        })
    }

    /// Resolve the detail-session config.
    pub fn detail(&self) -> Result<DetailConfig, ConfigError> {
        Ok(DetailConfig {
            base_url: required(&self.detail_base_url, "detail_base_url", "STOCKBOOK_DETAIL_BASE_URL")?,
            user_agent: self.user_agent.clone(),
        })
    }
}

fn required(value: &Option<String>, field: &str, hint_var: &str) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::Missing { field: field.into(), hint: format!("Set {hint_var}") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> AppConfig {
        AppConfig {
            stock_base_url: Some("https://portal.example.com".into()),
            stock_path: Some("/check_stock.php".into()),
            stock_username: Some("user".into()),
            stock_password: Some("pass".into()),
            stock_search_selector: Some("#searchBox".into()),
            stock_results_row_selector: Some("#listDiv tr".into()),
            detail_base_url: Some("https://specs.example.com".into()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_path, PathBuf::from("./stockbook-cache.json"));
        assert_eq!(config.products_path, PathBuf::from("./products.csv"));
        assert_eq!(config.stock_landing_marker, "calculator.php");
        assert!(config.stock_base_url.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_stock_config_resolves_when_complete() {
        let stock = full_config().stock().unwrap();
        assert_eq!(stock.base_url, "https://portal.example.com");
        assert_eq!(stock.username_selector, "#UserName1");
    }

    #[test]
    fn test_stock_config_missing_credential() {
        let config = AppConfig { stock_password: None, ..full_config() };
        let result = config.stock();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "stock_password"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let config = AppConfig { stock_username: Some("   ".into()), ..full_config() };
        let result = config.stock();
        assert!(matches!(result, Err(ConfigError::Missing { field, .. }) if field == "stock_username"));
    }

    #[test]
    fn test_detail_config_requires_base_url() {
        let config = AppConfig { detail_base_url: None, ..full_config() };
        assert!(matches!(config.detail(), Err(ConfigError::Missing { .. })));
        assert_eq!(full_config().detail().unwrap().base_url, "https://specs.example.com");
    }
}
