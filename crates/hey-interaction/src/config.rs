//! Credentials and endpoint for the completion API.

use hey_core::error::{HeyError, Result};
use std::env;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Where to send requests and how to authenticate.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reads `OPENAI_API_KEY` (required) and `OPENAI_BASE_URL` (optional).
    pub fn from_env() -> Result<Self> {
        Self::from_values(env::var(API_KEY_ENV).ok(), env::var(BASE_URL_ENV).ok())
    }

    fn from_values(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                HeyError::config(format!(
                    "{API_KEY_ENV} is not set. Export your API key, e.g. `export {API_KEY_ENV}=sk-...`"
                ))
            })?;
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(api_key, base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = ApiConfig::from_values(None, None).unwrap_err();
        assert!(matches!(err, HeyError::Config(_)));
        let err = ApiConfig::from_values(Some("  ".into()), None).unwrap_err();
        assert!(matches!(err, HeyError::Config(_)));
    }

    #[test]
    fn test_default_base_url() {
        let config = ApiConfig::from_values(Some("sk-test".into()), None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_base_url_override_drops_trailing_slash() {
        let config =
            ApiConfig::from_values(Some("sk-test".into()), Some("http://localhost:8080/v1/".into()))
                .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_hides_key() {
        let config = ApiConfig::new("sk-secret", DEFAULT_BASE_URL);
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
