//! Resolved runtime settings shared by all commands.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::debug;

use mz_api::{ApiClient, ApiConfig, API_KEY_ENV, DEFAULT_API_BASE_URL};
use mz_chat::LocalStore;

use crate::commands::Cli;

/// Data directory used when neither `--data-dir` nor `MISSIONIZE_HOME` is set
pub const DEFAULT_DATA_DIR: &str = ".missionize";

/// Where the API base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    Argument,
    Stored,
    Default,
}

impl fmt::Display for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Argument => "--api-url / MISSIONIZE_API_URL",
            Self::Stored => "saved setting",
            Self::Default => "default",
        };
        f.write_str(label)
    }
}

pub struct Context {
    pub store: LocalStore,
    pub client: ApiClient,
    pub url_source: UrlSource,
}

impl Context {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        Self::build(
            cli.api_url.clone(),
            cli.data_dir.clone(),
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    /// Resolve settings from explicit inputs.
    ///
    /// Base URL: argument, then stored override, then the hosted default.
    /// API key: environment, then stored key. The session token always
    /// comes from the store.
    pub fn build(
        api_url: Option<String>,
        data_dir: Option<PathBuf>,
        env_api_key: Option<String>,
    ) -> Result<Self> {
        let root = data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let store = LocalStore::new(&root);

        let stored_url = store.api_url().context("Failed to read saved API URL")?;
        let (base_url, url_source) = match (non_blank(api_url), stored_url) {
            (Some(url), _) => (url, UrlSource::Argument),
            (None, Some(url)) => (url, UrlSource::Stored),
            (None, None) => (DEFAULT_API_BASE_URL.to_string(), UrlSource::Default),
        };

        let mut config = ApiConfig::new(base_url);
        let api_key = match non_blank(env_api_key) {
            Some(key) => Some(key),
            None => store.api_key().context("Failed to read saved API key")?,
        };
        if let Some(key) = api_key {
            config = config.api_key(key);
        }
        if let Some(token) = store.token().context("Failed to read session token")? {
            config = config.bearer_token(token);
        }

        debug!(
            data_dir = %root.display(),
            base_url = %config.base_url,
            source = %url_source,
            "context resolved"
        );

        Ok(Self {
            store,
            client: ApiClient::new(config),
            url_source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_overrides() {
        let temp = tempdir().unwrap();
        let ctx = Context::build(None, Some(temp.path().to_path_buf()), None).unwrap();

        assert_eq!(ctx.client.base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(ctx.url_source, UrlSource::Default);
        assert!(ctx.client.config().api_key.is_none());
        assert!(ctx.client.config().bearer_token.is_none());
    }

    #[test]
    fn test_argument_beats_stored_url() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.set_api_url(Some("http://stored:8000")).unwrap();

        let ctx = Context::build(None, Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(ctx.client.base_url(), "http://stored:8000");
        assert_eq!(ctx.url_source, UrlSource::Stored);

        let ctx = Context::build(
            Some("http://localhost:9000".into()),
            Some(temp.path().to_path_buf()),
            None,
        )
        .unwrap();
        assert_eq!(ctx.client.base_url(), "http://localhost:9000");
        assert_eq!(ctx.url_source, UrlSource::Argument);
    }

    #[test]
    fn test_environment_key_beats_stored_key() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.set_api_key(Some("mz_live_stored")).unwrap();
        store.set_token(Some("jwt-abc")).unwrap();

        let ctx = Context::build(None, Some(temp.path().to_path_buf()), Some("  ".into())).unwrap();
        assert_eq!(ctx.client.config().api_key.as_deref(), Some("mz_live_stored"));
        assert_eq!(ctx.client.config().bearer_token.as_deref(), Some("jwt-abc"));

        let ctx = Context::build(
            None,
            Some(temp.path().to_path_buf()),
            Some("mz_live_env".into()),
        )
        .unwrap();
        assert_eq!(ctx.client.config().api_key.as_deref(), Some("mz_live_env"));
    }
}
