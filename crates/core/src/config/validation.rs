//! Configuration validation rules.
//!
//! Validation runs once after loading. Required per-session keys are
//! checked by the typed accessors in the parent module; this pass catches
//! values that are present but unusable.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `user_agent` is empty
    /// - a provided base URL does not start with http(s)
    /// - `stock_path` does not start with `/`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, value) in [
            ("stock_base_url", &self.stock_base_url),
            ("detail_base_url", &self.detail_base_url),
        ] {
            if let Some(url) = value
                && !url.trim().is_empty()
                && !url.starts_with("http://")
                && !url.starts_with("https://")
            {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must start with http:// or https://".into(),
                });
            }
        }

        if let Some(path) = &self.stock_path
            && !path.trim().is_empty()
            && !path.starts_with('/')
        {
            return Err(ConfigError::Invalid {
                field: "stock_path".into(),
                reason: "must start with /".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_bad_base_url() {
        let config = AppConfig { stock_base_url: Some("portal.example.com".into()), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "stock_base_url"));
    }

    #[test]
    fn test_validate_relative_stock_path() {
        let config = AppConfig { stock_path: Some("check_stock.php".into()), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "stock_path"));
    }

    #[test]
    fn test_validate_good_urls() {
        let config = AppConfig {
            stock_base_url: Some("https://portal.example.com".into()),
            stock_path: Some("/check_stock.php".into()),
            detail_base_url: Some("http://specs.example.com".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
