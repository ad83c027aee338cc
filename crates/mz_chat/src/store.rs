//! Local key-value persistence for the console.
//!
//! Every setting lives in its own file under the data directory, named after
//! its key:
//! ```text
//! <data-dir>/
//! ├── missionize_conversations   # JSON array of conversations
//! ├── missionize_selected_model  # model id
//! ├── missionize_chat_mode       # "fast" | "mission"
//! ├── missionize_api_url         # API base URL override
//! ├── missionize_api_key         # X-API-Key credential
//! ├── missionize_jwt             # bearer token
//! └── enable_enterprise_mode     # UI toggles ("true" | "false")
//! ```
//!
//! Values that fail to parse are treated as absent and logged; a damaged
//! file never prevents the console from starting.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ChatResult;
use crate::types::{ChatMode, Conversation};

pub const CONVERSATIONS_KEY: &str = "missionize_conversations";
pub const SELECTED_MODEL_KEY: &str = "missionize_selected_model";
pub const CHAT_MODE_KEY: &str = "missionize_chat_mode";
pub const API_URL_KEY: &str = "missionize_api_url";
pub const API_KEY_KEY: &str = "missionize_api_key";
pub const TOKEN_KEY: &str = "missionize_jwt";

/// Boolean display preferences kept alongside the chat data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiToggle {
    EnterpriseMode,
    MultiWorkerView,
    MizziIndicators,
}

impl UiToggle {
    pub const ALL: [UiToggle; 3] = [
        UiToggle::EnterpriseMode,
        UiToggle::MultiWorkerView,
        UiToggle::MizziIndicators,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::EnterpriseMode => "enable_enterprise_mode",
            Self::MultiWorkerView => "show_multiworker_view",
            Self::MizziIndicators => "enable_mizzi_indicators",
        }
    }

    /// Value assumed when the key was never written
    pub fn default_value(&self) -> bool {
        matches!(self, Self::MizziIndicators)
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.key() == name || t.key().ends_with(&format!("_{}", name)))
    }
}

/// File-backed key-value store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at a data directory. The directory is created on
    /// first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Raw value for a key, `None` when never written
    pub fn get(&self, key: &str) -> ChatResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> ChatResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path(key), value)?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> ChatResult<bool> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Trimmed, non-empty value for a key
    fn get_text(&self, key: &str) -> ChatResult<Option<String>> {
        Ok(self
            .get(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    fn set_or_clear(&self, key: &str, value: Option<&str>) -> ChatResult<()> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.set(key, v),
            None => self.remove(key).map(|_| ()),
        }
    }

    // -------------------------------------------------------------------
    // Conversations
    // -------------------------------------------------------------------

    /// Load the conversation list, most recent first.
    pub fn load_conversations(&self) -> ChatResult<Vec<Conversation>> {
        let Some(raw) = self.get(CONVERSATIONS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(conversations) => Ok(conversations),
            Err(e) => {
                warn!(key = CONVERSATIONS_KEY, error = %e, "stored conversations are unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_conversations(&self, conversations: &[Conversation]) -> ChatResult<()> {
        let content = serde_json::to_string(conversations)?;
        self.set(CONVERSATIONS_KEY, &content)
    }

    // -------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------

    pub fn load_selected_model(&self) -> ChatResult<Option<String>> {
        self.get_text(SELECTED_MODEL_KEY)
    }

    pub fn save_selected_model(&self, model_id: &str) -> ChatResult<()> {
        self.set(SELECTED_MODEL_KEY, model_id)
    }

    /// Stored chat mode, `Fast` when absent or unreadable
    pub fn load_chat_mode(&self) -> ChatResult<ChatMode> {
        let Some(raw) = self.get_text(CHAT_MODE_KEY)? else {
            return Ok(ChatMode::default());
        };
        Ok(raw.parse().unwrap_or_else(|_| {
            warn!(key = CHAT_MODE_KEY, value = %raw, "unknown chat mode, using fast");
            ChatMode::default()
        }))
    }

    pub fn save_chat_mode(&self, mode: ChatMode) -> ChatResult<()> {
        self.set(CHAT_MODE_KEY, mode.as_str())
    }

    pub fn toggle(&self, toggle: UiToggle) -> ChatResult<bool> {
        Ok(match self.get_text(toggle.key())? {
            Some(v) => v == "true",
            None => toggle.default_value(),
        })
    }

    pub fn set_toggle(&self, toggle: UiToggle, enabled: bool) -> ChatResult<()> {
        self.set(toggle.key(), if enabled { "true" } else { "false" })
    }

    // -------------------------------------------------------------------
    // Credentials and endpoint
    // -------------------------------------------------------------------

    pub fn api_url(&self) -> ChatResult<Option<String>> {
        self.get_text(API_URL_KEY)
    }

    /// Store an API URL override; `None` or blank clears it
    pub fn set_api_url(&self, url: Option<&str>) -> ChatResult<()> {
        self.set_or_clear(API_URL_KEY, url)
    }

    pub fn api_key(&self) -> ChatResult<Option<String>> {
        self.get_text(API_KEY_KEY)
    }

    pub fn set_api_key(&self, key: Option<&str>) -> ChatResult<()> {
        self.set_or_clear(API_KEY_KEY, key)
    }

    pub fn token(&self) -> ChatResult<Option<String>> {
        self.get_text(TOKEN_KEY)
    }

    pub fn set_token(&self, token: Option<&str>) -> ChatResult<()> {
        self.set_or_clear(TOKEN_KEY, token)
    }

    /// Drop stored credentials. Conversations are kept.
    pub fn logout(&self) -> ChatResult<()> {
        self.remove(TOKEN_KEY)?;
        self.remove(API_KEY_KEY)?;
        Ok(())
    }

    /// Restore endpoint and display preferences to their defaults
    pub fn reset_settings(&self) -> ChatResult<()> {
        self.remove(API_URL_KEY)?;
        for toggle in UiToggle::ALL {
            self.remove(toggle.key())?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------

    /// All stored keys with their sizes in bytes, sorted by key
    pub fn entries(&self) -> ChatResult<Vec<(String, u64)>> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                entries.push((entry.file_name().to_string_lossy().into_owned(), metadata.len()));
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Remove every stored key. Returns how many were removed.
    pub fn clear(&self) -> ChatResult<usize> {
        let entries = self.entries()?;
        for (key, _) in &entries {
            self.remove(key)?;
        }
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    use crate::types::Message;

    #[test]
    fn test_conversations_round_trip() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());

        let mut conversation = Conversation::new(Utc::now());
        conversation
            .messages
            .push(Message::user("hello", Vec::new(), Utc::now()));
        store.save_conversations(&[conversation.clone()]).unwrap();

        let loaded = store.load_conversations().unwrap();
        assert_eq!(loaded, vec![conversation]);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path().join("never-created"));

        assert!(store.load_conversations().unwrap().is_empty());
        assert_eq!(store.load_selected_model().unwrap(), None);
        assert_eq!(store.load_chat_mode().unwrap(), ChatMode::Fast);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_conversations_load_as_empty() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.set(CONVERSATIONS_KEY, "{not json").unwrap();

        assert!(store.load_conversations().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_mode_falls_back_to_fast() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.set(CHAT_MODE_KEY, "warp").unwrap();
        assert_eq!(store.load_chat_mode().unwrap(), ChatMode::Fast);

        store.save_chat_mode(ChatMode::Mission).unwrap();
        assert_eq!(store.load_chat_mode().unwrap(), ChatMode::Mission);
    }

    #[test]
    fn test_blank_credentials_clear_the_key() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());

        store.set_api_key(Some("mz_live_123")).unwrap();
        assert_eq!(store.api_key().unwrap().as_deref(), Some("mz_live_123"));

        store.set_api_key(Some("   ")).unwrap();
        assert_eq!(store.api_key().unwrap(), None);
    }

    #[test]
    fn test_logout_keeps_conversations() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.set_token(Some("jwt")).unwrap();
        store.set_api_key(Some("key")).unwrap();
        store.save_conversations(&[Conversation::new(Utc::now())]).unwrap();

        store.logout().unwrap();

        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.api_key().unwrap(), None);
        assert_eq!(store.load_conversations().unwrap().len(), 1);
    }

    #[test]
    fn test_toggles_and_reset() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());

        assert!(!store.toggle(UiToggle::EnterpriseMode).unwrap());
        assert!(store.toggle(UiToggle::MizziIndicators).unwrap());

        store.set_toggle(UiToggle::EnterpriseMode, true).unwrap();
        store.set_api_url(Some("http://localhost:8000")).unwrap();
        assert!(store.toggle(UiToggle::EnterpriseMode).unwrap());

        store.reset_settings().unwrap();
        assert!(!store.toggle(UiToggle::EnterpriseMode).unwrap());
        assert_eq!(store.api_url().unwrap(), None);
    }

    #[test]
    fn test_toggle_parse() {
        assert_eq!(UiToggle::parse("enterprise-mode"), Some(UiToggle::EnterpriseMode));
        assert_eq!(UiToggle::parse("multiworker_view"), Some(UiToggle::MultiWorkerView));
        assert_eq!(UiToggle::parse("mizzi_indicators"), Some(UiToggle::MizziIndicators));
        assert_eq!(UiToggle::parse("dark"), None);
    }

    #[test]
    fn test_entries_and_clear() {
        let temp = tempdir().unwrap();
        let store = LocalStore::new(temp.path());
        store.save_selected_model("gpt-4o").unwrap();
        store.save_chat_mode(ChatMode::Fast).unwrap();

        let entries = store.entries().unwrap();
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec![CHAT_MODE_KEY, SELECTED_MODEL_KEY]);
        assert_eq!(entries[1].1, 6);

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.entries().unwrap().is_empty());
    }
}
