use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{BackendSettings, EngineKind};
use crate::error::{Error, Result};

/// Pseudo language code meaning "detect at call time"
pub const AUTO: &str = "auto";

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn auto() -> Self {
        Self::new(AUTO)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_auto(&self) -> bool {
        self.0.eq_ignore_ascii_case(AUTO)
    }

    /// Compare two codes ignoring ASCII case ("zh-CN" == "zh-cn")
    pub fn matches(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

// Serde default functions for common languages
fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which text the poll loop remembers after a successful translation.
///
/// Remembering the translation means a copy of the machine's own output is
/// not processed again; remembering the original means it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedText {
    Original,
    #[default]
    Translated,
}

impl std::str::FromStr for ObservedText {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "translated" => Ok(Self::Translated),
            other => Err(Error::ConfigInvalid {
                field: "track_observed".to_string(),
                reason: format!("expected 'original' or 'translated', got '{other}'"),
            }),
        }
    }
}

/// Per-engine settings section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// API key (empty = fall back to the environment)
    #[serde(default)]
    pub api_key: String,

    /// Model identifier for LLM-backed engines (None = backend default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Alternative API base URL (OpenAI-compatible servers, DeepL Pro host)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Active engine identifier
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Source language used when none is given on the command line
    #[serde(default = "default_source_lang")]
    pub default_source: Lang,

    /// Target language used when none is given on the command line
    #[serde(default = "default_target_lang")]
    pub default_target: Lang,

    /// Cache translations for the lifetime of the process
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Show romaji readings for Japanese text
    #[serde(default)]
    pub show_romaji: bool,

    /// Show hiragana readings for Japanese text
    #[serde(default)]
    pub show_hiragana: bool,

    /// Text remembered by the poll loop after a successful translation
    #[serde(default)]
    pub track_observed: ObservedText,

    /// Delay between clipboard reads
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for a single detect/translate call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub google: EngineSettings,

    #[serde(default)]
    pub openai: EngineSettings,

    #[serde(default)]
    pub deepl: EngineSettings,

    #[serde(default)]
    pub claude: EngineSettings,

    /// Where this configuration is persisted (None = memory only)
    #[serde(skip)]
    path: Option<PathBuf>,
}

fn default_engine() -> String {
    EngineKind::Google.as_str().to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            default_source: default_source_lang(),
            default_target: default_target_lang(),
            cache_enabled: true,
            show_romaji: false,
            show_hiragana: false,
            track_observed: ObservedText::default(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            google: EngineSettings::default(),
            openai: EngineSettings::default(),
            deepl: EngineSettings::default(),
            claude: EngineSettings::default(),
            path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigLoad(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults that will be saved there.
    ///
    /// A missing file is not an error; an unreadable one is logged and ignored.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), e);
                }
            }
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
        }

        Self::default().with_path(path)
    }

    /// Load from the default location (~/.config/clip-translate/config.toml)
    pub fn load() -> Self {
        Self::load_or_default(crate::util::default_config_path())
    }

    /// Attach a persistence path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the configuration back to its file.
    ///
    /// A configuration without a path lives in memory only; saving it is a no-op.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            tracing::debug!("Config has no path, not persisting");
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigSave(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigSave(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| Error::ConfigSave(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Settings section for an engine
    pub fn engine_settings(&self, kind: EngineKind) -> &EngineSettings {
        match kind {
            EngineKind::Google => &self.google,
            EngineKind::OpenAi => &self.openai,
            EngineKind::DeepL => &self.deepl,
            EngineKind::Claude => &self.claude,
        }
    }

    pub fn engine_settings_mut(&mut self, kind: EngineKind) -> &mut EngineSettings {
        match kind {
            EngineKind::Google => &mut self.google,
            EngineKind::OpenAi => &mut self.openai,
            EngineKind::DeepL => &mut self.deepl,
            EngineKind::Claude => &mut self.claude,
        }
    }

    /// Active engine identifier as stored (may be unknown)
    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn set_engine(&mut self, kind: EngineKind) {
        self.engine = kind.as_str().to_string();
    }

    pub fn set_api_key(&mut self, kind: EngineKind, api_key: impl Into<String>) {
        self.engine_settings_mut(kind).api_key = api_key.into();
    }

    pub fn set_model(&mut self, kind: EngineKind, model: impl Into<String>) {
        self.engine_settings_mut(kind).model = Some(model.into());
    }

    /// API key for an engine: config file first, environment second.
    pub fn api_key(&self, kind: EngineKind) -> Option<String> {
        let configured = self.engine_settings(kind).api_key.trim();
        if !configured.is_empty() {
            return Some(configured.to_string());
        }

        kind.api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Resolved settings handed to the backend factory
    pub fn backend_settings(&self, kind: EngineKind) -> BackendSettings {
        let section = self.engine_settings(kind);
        BackendSettings {
            api_key: self.api_key(kind),
            model: section.model.clone(),
            api_base: section.api_base.clone(),
            timeout: self.request_timeout(),
        }
    }

    /// Whether an engine has what it needs to attempt calls
    pub fn validate_engine_config(&self, kind: EngineKind) -> bool {
        !kind.requires_api_key() || self.api_key(kind).is_some()
    }

    /// Engines that can be used right now (Google is always available)
    pub fn available_engines(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|kind| self.validate_engine_config(*kind))
            .collect()
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "ja";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "en";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.engine(), "google");
        assert_eq!(config.default_source.as_str(), "ja");
        assert_eq!(config.default_target.as_str(), "en");
        assert!(config.cache_enabled);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.track_observed, ObservedText::Translated);
        assert!(config.path().is_none());
    }

    #[test]
    fn test_partial_document_merges_over_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            engine = "deepl"
            show_romaji = true

            [openai]
            api_key = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine(), "deepl");
        assert!(config.show_romaji);
        assert!(config.cache_enabled);
        assert_eq!(config.default_target.as_str(), "en");
        assert_eq!(config.openai.api_key, "sk-test");
        assert_eq!(config.openai.model, None);
        assert_eq!(config.claude, EngineSettings::default());
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let mut config = AppConfig::default();
        config.set_api_key(EngineKind::DeepL, "from-file");
        assert_eq!(config.api_key(EngineKind::DeepL).as_deref(), Some("from-file"));
        assert!(config.validate_engine_config(EngineKind::DeepL));
    }

    #[test]
    fn test_google_needs_no_key() {
        let config = AppConfig::default();
        assert!(config.validate_engine_config(EngineKind::Google));
        assert!(config.available_engines().contains(&EngineKind::Google));
        assert_eq!(config.api_key(EngineKind::Google), None);
    }

    #[test]
    fn test_observed_text_parse() {
        assert_eq!("Original".parse::<ObservedText>().unwrap(), ObservedText::Original);
        assert_eq!("translated".parse::<ObservedText>().unwrap(), ObservedText::Translated);
        assert!("both".parse::<ObservedText>().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::load_or_default(&path);
        config.set_engine(EngineKind::Claude);
        config.set_api_key(EngineKind::Claude, "sk-ant-test");
        config.set_model(EngineKind::Claude, "claude-3-5-haiku-latest");
        config.save().unwrap();

        let reloaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(reloaded.engine(), "claude");
        assert_eq!(reloaded.claude.api_key, "sk-ant-test");
        assert_eq!(reloaded.claude.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(reloaded.path(), Some(path.as_path()));
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "engine = [not toml").unwrap();

        let config = AppConfig::load_or_default(&path);
        assert_eq!(config.engine(), "google");
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_without_path_is_noop() {
        assert!(AppConfig::default().save().is_ok());
    }

    #[test]
    fn test_lang_matching() {
        assert!(Lang::new("zh-CN").matches(&Lang::new("zh-cn")));
        assert!(!Lang::new("en").matches(&Lang::new("en-us")));
        assert!(Lang::new("AUTO").is_auto());
    }
}
