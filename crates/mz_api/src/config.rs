//! Client configuration.

use std::time::Duration;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://api.missionize.ai";

/// Client-side deadline for a mission-mode consensus run.
pub const MISSION_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "MISSIONIZE_API_URL";

/// Environment variable providing an API key.
pub const API_KEY_ENV: &str = "MISSIONIZE_API_KEY";

/// Connection and authentication settings for [`crate::ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Key sent as `X-API-Key`
    pub api_key: Option<String>,
    /// Token sent as `Authorization: Bearer`
    pub bearer_token: Option<String>,
    /// Deadline applied to mission-mode runs
    pub mission_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            api_key: None,
            bearer_token: None,
            mission_timeout: MISSION_TIMEOUT,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    pub fn mission_timeout(mut self, timeout: Duration) -> Self {
        self.mission_timeout = timeout;
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, "https://api.missionize.ai");
        assert_eq!(config.mission_timeout.as_millis(), 120_000);
        assert!(config.api_key.is_none());
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ApiConfig::new("http://localhost:8000/");
        assert_eq!(config.url("/health"), "http://localhost:8000/health");
        assert_eq!(config.url("health"), "http://localhost:8000/health");
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let config = ApiConfig::default().api_key("  ").bearer_token("");
        assert!(config.api_key.is_none());
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn test_blank_base_url_falls_back() {
        assert_eq!(ApiConfig::new("   ").base_url, DEFAULT_API_BASE_URL);
    }
}
