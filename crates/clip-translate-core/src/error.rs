use thiserror::Error;

/// Unified error type for clip-translate-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Engine selection (unknown identifiers, unusable backends, unsupported languages)
/// - Backend calls (requests, responses, authentication, rate limiting, timeouts)
/// - Configuration operations (loading, saving, validation)
/// - Clipboard access
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Engine Errors
    // ==========================================================================
    /// Engine identifier is not one of the known backends
    #[error("unknown translation engine: {0}")]
    UnknownEngine(String),

    /// Candidate backend is missing required configuration (usually an API key)
    #[error("translation engine '{0}' is not configured - check API key")]
    EngineNotConfigured(String),

    /// Backend could not be constructed
    #[error("failed to initialize translation backend: {0}")]
    BackendInit(String),

    /// Language code is absent from the active backend's table
    #[error("unsupported language '{code}' for engine {engine}")]
    UnsupportedLanguage { code: String, engine: String },

    // ==========================================================================
    // Backend Call Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// API rejected the credentials
    #[error("translation API rejected credentials: {0}")]
    TranslationAuth(String),

    /// API key not configured for translation service
    #[error("translation API key not configured")]
    TranslationMissingApiKey,

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// A backend failure surfaced through the translation engine
    #[error("{engine} translation failed: {source}")]
    Translation {
        engine: String,
        #[source]
        source: Box<Error>,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Failed to save configuration file
    #[error("failed to save config: {0}")]
    ConfigSave(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // Clipboard Errors
    // ==========================================================================
    /// Clipboard could not be read or written
    #[error("clipboard error: {0}")]
    Clipboard(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a backend failure as a translation error for the given engine
    pub fn translation(engine: impl Into<String>, source: Self) -> Self {
        Self::Translation {
            engine: engine.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error (or the backend error it wraps) is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::TranslationTimeout => true,
            Self::Translation { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
