use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use keyring::Entry;
use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};

const KEYRING_SERVICE: &str = "thai-flow";
const KEYRING_ACCOUNT: &str = "gemini_api_key";

/// Environment variables checked, in order, for the Gemini API key
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api: ApiSettings,
    pub history: HistorySettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Never read from or written to the settings file
    #[serde(skip)]
    pub gemini_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_items: usize,
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
            gemini_api_key: None,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_items: 8,
            storage_key: "translationHistory".to_string(),
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppSettings {
    pub fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "thaiflow", "thai-flow")
            .ok_or_else(|| AppError::Config("Failed to determine project directories".to_string()))
    }

    pub fn get_settings_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("settings.json"))
    }

    /// Load settings from the platform config dir, then apply env overrides
    /// and resolve the API key.
    ///
    /// Never fails: a missing file means defaults, a broken one is logged and
    /// replaced by defaults.
    pub async fn load() -> Self {
        let mut settings = match Self::get_settings_path() {
            Ok(path) => Self::load_from(&path).await.unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Self::default()
            }),
            Err(e) => {
                warn!(error = %e, "No config directory, using default settings");
                Self::default()
            }
        };

        settings.apply_env_overrides(|name| std::env::var(name).ok());
        if settings.api.gemini_api_key.is_none() {
            settings.api.gemini_api_key = load_api_key_from_keyring();
        }
        settings
    }

    /// Read a settings file. A missing file yields the defaults.
    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Apply `THAI_FLOW_*` overrides and pick up the API key from the
    /// environment. `lookup` abstracts `std::env::var` for tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty("THAI_FLOW_MODEL") {
            self.api.model = model;
        }
        if let Some(base_url) = non_empty("THAI_FLOW_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Some(key) = API_KEY_VARS.iter().find_map(|&name| non_empty(name)) {
            self.api.gemini_api_key = Some(key);
        }
    }
}

fn load_api_key_from_keyring() -> Option<String> {
    match Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT) {
        Ok(entry) => match entry.get_password() {
            Ok(pw) if !pw.trim().is_empty() => Some(pw),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Keyring lookup for API key failed");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "Failed to access keyring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load_from(&dir.path().join("settings.json")).await.unwrap();
        assert_eq!(settings.api.model, "gemini-2.5-flash");
        assert_eq!(settings.history.max_items, 8);
        assert_eq!(settings.history.storage_key, "translationHistory");
        assert!(settings.speech.enabled);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"history": {"max_items": 3}, "api": {"gemini_api_key": "leak"}}"#).unwrap();

        let settings = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(settings.history.max_items, 3);
        assert_eq!(settings.history.storage_key, "translationHistory");
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.api.gemini_api_key, None);
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = AppSettings::load_from(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = [
            ("THAI_FLOW_MODEL", "gemini-test"),
            ("THAI_FLOW_BASE_URL", "http://localhost:9"),
            ("API_KEY", "fallback-key"),
            ("GEMINI_API_KEY", "  "),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        settings.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api.model, "gemini-test");
        assert_eq!(settings.api.base_url, "http://localhost:9");
        assert_eq!(settings.api.gemini_api_key.as_deref(), Some("fallback-key"));
    }

    #[test]
    fn serialized_settings_never_contain_the_key() {
        let mut settings = AppSettings::default();
        settings.api.gemini_api_key = Some("secret".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }
}
