use async_trait::async_trait;

use super::languages::LanguageTable;
use crate::config::Lang;
use crate::error::Result;

/// Longest prefix (in characters) sent to a provider for language detection
pub const DETECT_PREFIX_CHARS: usize = 500;

/// Information about a translation backend
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Whether this backend requires an API key
    pub requires_api_key: bool,
    /// Whether this backend supports auto-detection of source language
    pub supports_auto_detect: bool,
}

/// Trait for translation backends
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get information about this backend
    fn info(&self) -> BackendInfo;

    /// Get the backend name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Detect the language of `text`.
    ///
    /// `Ok(None)` means the provider could not classify the text, answered
    /// with a code outside its table, or has no credentials to ask with.
    /// Transport failures are errors.
    async fn detect_language(&self, text: &str) -> Result<Option<Lang>>;

    /// Translate text from source language to target language
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;

    /// Code to display-name table for this provider
    fn supported_languages(&self) -> &'static LanguageTable;

    /// Whether the backend has everything required to attempt calls.
    ///
    /// Local check only, never touches the network.
    fn validate_config(&self) -> bool;
}
