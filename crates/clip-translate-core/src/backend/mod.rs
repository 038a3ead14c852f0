//! Translation backends and the factory that builds them.

mod claude;
mod deepl;
mod google;
mod http;
pub mod languages;
mod openai;
mod prompt;
mod traits;

pub use claude::ClaudeBackend;
pub use deepl::DeepLBackend;
pub use google::GoogleBackend;
pub use languages::LanguageTable;
pub use openai::OpenAiBackend;
pub use traits::{Backend, BackendInfo, DETECT_PREFIX_CHARS};

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Lang;
use crate::error::{Error, Result};

/// Upper bound for a connection probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Stable engine identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Google,
    OpenAi,
    DeepL,
    Claude,
}

impl EngineKind {
    pub const ALL: [Self; 4] = [Self::Google, Self::OpenAi, Self::DeepL, Self::Claude];

    /// The always-available engine used for failover
    pub const DEFAULT: Self = Self::Google;

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::DeepL => "deepl",
            Self::Claude => "claude",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google Translate",
            Self::OpenAi => "OpenAI",
            Self::DeepL => "DeepL",
            Self::Claude => "Claude",
        }
    }

    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Google)
    }

    /// Environment variable consulted when the config has no key
    pub const fn api_key_env(self) -> Option<&'static str> {
        match self {
            Self::Google => None,
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::DeepL => Some("DEEPL_API_KEY"),
            Self::Claude => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Language table of this engine, without building a backend
    pub fn languages(self) -> &'static LanguageTable {
        match self {
            Self::Google => &languages::GOOGLE,
            Self::OpenAi => languages::OPENAI,
            Self::DeepL => &languages::DEEPL,
            Self::Claude => languages::CLAUDE,
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnknownEngine(s.to_string()))
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved settings handed to a backend constructor
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    /// Transport timeout for each HTTP request
    pub timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            api_base: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Signature of a backend factory; the engine can be given an alternative one
pub type BackendFactory = fn(EngineKind, &BackendSettings) -> Result<Arc<dyn Backend>>;

/// Create a backend for an engine.
///
/// Missing credentials do not fail construction; they show up later through
/// [`Backend::validate_config`].
pub fn create_backend(kind: EngineKind, settings: &BackendSettings) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match kind {
        EngineKind::Google => Arc::new(GoogleBackend::new(settings)?),
        EngineKind::OpenAi => Arc::new(OpenAiBackend::new(settings)?),
        EngineKind::DeepL => Arc::new(DeepLBackend::new(settings)?),
        EngineKind::Claude => Arc::new(ClaudeBackend::new(settings)?),
    };
    Ok(backend)
}

/// Create a backend from an identifier (case-insensitive).
///
/// Unknown identifiers fail before anything is constructed.
pub fn get_backend(identifier: &str, settings: &BackendSettings) -> Result<Arc<dyn Backend>> {
    let kind: EngineKind = identifier.parse()?;
    create_backend(kind, settings)
}

/// Outcome of a connection test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub engine: EngineKind,
    pub success: bool,
    pub message: String,
}

/// Check that a backend is usable.
///
/// Configuration problems are reported without touching the network. The
/// free Google backend is reported available as-is; every other backend has
/// to translate a short probe within [`PROBE_TIMEOUT`].
pub async fn probe_backend(kind: EngineKind, backend: &dyn Backend) -> ConnectionReport {
    let report = |success: bool, message: String| ConnectionReport {
        engine: kind,
        success,
        message,
    };

    if !backend.validate_config() {
        warn!("Invalid config for {}", kind);
        return report(false, "Invalid configuration - check API key".to_string());
    }

    if !backend.info().requires_api_key && kind == EngineKind::Google {
        return report(true, "Google Translate is available (no API key needed)".to_string());
    }

    info!("Starting translation test for {}", kind);
    let (source, target) = (Lang::new("en"), Lang::new("es"));
    let probe = backend.translate("Hello", &source, &target);
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(result)) if !result.trim().is_empty() => {
            info!("Test successful for {}: {}", kind, result);
            let preview: String = result.chars().take(50).collect();
            report(true, format!("Connection successful! Test translation: '{preview}'"))
        }
        Ok(Ok(_)) => report(false, "Translation test failed - empty response".to_string()),
        Ok(Err(e)) => {
            warn!("Translation test failed for {}: {}", kind, e);
            report(false, format!("Translation test failed: {e}"))
        }
        Err(_) => report(
            false,
            format!("Translation test timed out after {}s", PROBE_TIMEOUT.as_secs()),
        ),
    }
}
