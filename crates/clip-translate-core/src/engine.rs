use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{create_backend, Backend, BackendFactory, BackendInfo, EngineKind, LanguageTable};
use crate::cache::{CachedTranslation, TranslationCache};
use crate::config::{AppConfig, Lang};
use crate::error::{Error, Result};
use crate::reading::{render_reading, KakasiConverter, ReadingConverter, ReadingMode};
use crate::util::normalize_lines;

/// Outcome of [`TranslationEngine::translate_text`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Provider output with blank lines removed
    pub translated: String,
    /// Input with blank lines removed, as sent to the provider
    pub original: String,
    /// Whether the result came from the cache
    pub cached: bool,
}

/// Translation engine combining the active backend, the result cache and
/// the reading converter.
///
/// One engine serves one caller at a time; share it behind a mutex.
pub struct TranslationEngine {
    kind: EngineKind,
    backend: Arc<dyn Backend>,
    cache: TranslationCache,
    reader: Option<Arc<dyn ReadingConverter>>,
    config: AppConfig,
    factory: BackendFactory,
}

impl TranslationEngine {
    /// Create an engine for the configured backend.
    ///
    /// Falls back to Google when the configured engine is unknown, cannot be
    /// built, or is missing its credentials. Fails only if Google itself
    /// cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_factory(config, create_backend)
    }

    /// Create an engine that builds its backends with `factory`
    pub fn with_factory(config: AppConfig, factory: BackendFactory) -> Result<Self> {
        let (kind, backend) = initialize(&config, factory)?;
        info!("Translation engine ready with {}", backend.name());

        Ok(Self {
            kind,
            backend,
            cache: TranslationCache::new(),
            reader: None,
            config,
            factory,
        })
    }

    /// Create an engine around an already-built backend
    pub fn with_backend(kind: EngineKind, backend: Arc<dyn Backend>, config: AppConfig) -> Self {
        Self {
            kind,
            backend,
            cache: TranslationCache::new(),
            reader: None,
            config,
            factory: create_backend,
        }
    }

    /// Replace the active backend.
    ///
    /// The candidate is rejected with [`Error::EngineNotConfigured`] when it
    /// lacks credentials, leaving the engine untouched. On success the choice
    /// is persisted and the cache emptied.
    pub fn switch_engine(&mut self, identifier: &str) -> Result<()> {
        let kind: EngineKind = identifier.parse()?;
        let candidate = (self.factory)(kind, &self.config.backend_settings(kind))?;

        if !candidate.validate_config() {
            warn!("Refusing to switch to {}: not configured", kind);
            return Err(Error::EngineNotConfigured(kind.to_string()));
        }

        self.kind = kind;
        self.backend = candidate;
        self.config.set_engine(kind);
        if let Err(e) = self.config.save() {
            warn!("Failed to persist engine choice: {}", e);
        }
        self.cache.clear();

        info!("Switched translation engine to {}", self.backend.name());
        Ok(())
    }

    /// Detect the language of `text`; `None` means inconclusive
    pub async fn detect_language(&self, text: &str) -> Result<Option<Lang>> {
        let detected = self.call(self.backend.detect_language(text)).await?;
        debug!("Detected language: {:?}", detected);
        Ok(detected)
    }

    /// Translate `text`, consulting the cache first when `use_cache` is set.
    ///
    /// The cache key is the raw text; the provider receives the text with
    /// blank lines removed. Failures are never cached.
    pub async fn translate_text(
        &self,
        text: &str,
        source: &Lang,
        target: &Lang,
        use_cache: bool,
    ) -> Result<TranslationResult> {
        let use_cache = use_cache && self.config.cache_enabled;

        if use_cache && let Some(hit) = self.cache.get(text).await {
            debug!("Cache hit ({} chars)", text.chars().count());
            return Ok(TranslationResult {
                translated: hit.translated,
                original: hit.original,
                cached: true,
            });
        }

        let original = normalize_lines(text);
        info!(
            "Translating {} chars {} -> {} with {}",
            original.chars().count(),
            source,
            target,
            self.backend.name()
        );

        let reply = self
            .call(self.backend.translate(&original, source, target))
            .await?;
        let translated = normalize_lines(&reply);

        if use_cache {
            self.cache
                .insert(
                    text,
                    CachedTranslation {
                        translated: translated.clone(),
                        original: original.clone(),
                    },
                )
                .await;
        }

        Ok(TranslationResult {
            translated,
            original,
            cached: false,
        })
    }

    /// Run a backend call under the configured timeout, tagging failures
    /// with the engine name
    async fn call<T: Send>(&self, fut: impl Future<Output = Result<T>> + Send) -> Result<T> {
        let engine = self.backend.name();
        match tokio::time::timeout(self.config.request_timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::translation(engine, e)),
            Err(_) => Err(Error::translation(engine, Error::TranslationTimeout)),
        }
    }

    /// Check both codes against the active backend's table before any call.
    ///
    /// `auto` is accepted as a source only.
    pub fn validate_languages(&self, source: &Lang, target: &Lang) -> Result<()> {
        let table = self.supported_languages();
        let unsupported = |lang: &Lang| Error::UnsupportedLanguage {
            code: lang.to_string(),
            engine: self.kind.to_string(),
        };

        if !table.contains(source.as_str()) {
            return Err(unsupported(source));
        }
        if target.is_auto() || !table.contains(target.as_str()) {
            return Err(unsupported(target));
        }
        Ok(())
    }

    pub fn supported_languages(&self) -> &'static LanguageTable {
        self.backend.supported_languages()
    }

    /// Language table of another engine, without switching to it
    pub fn supported_languages_for(&self, identifier: &str) -> Result<&'static LanguageTable> {
        let kind: EngineKind = identifier.parse()?;
        Ok(kind.languages())
    }

    /// Install the bundled dictionary converter
    pub fn setup_reading_converter(&mut self) {
        self.set_reading_converter(Some(Arc::new(KakasiConverter::new())));
    }

    pub fn set_reading_converter(&mut self, reader: Option<Arc<dyn ReadingConverter>>) {
        self.reader = reader;
    }

    /// Reading of Japanese `text`, or `None` when no converter is installed
    /// or no line had anything to convert
    pub fn japanese_reading(&self, text: &str, mode: ReadingMode) -> Option<String> {
        let reader = self.reader.as_deref()?;
        render_reading(reader, text, mode)
    }

    pub const fn active_engine(&self) -> EngineKind {
        self.kind
    }

    pub fn backend_info(&self) -> BackendInfo {
        self.backend.info()
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Build the configured backend, falling back to the default engine
fn initialize(config: &AppConfig, factory: BackendFactory) -> Result<(EngineKind, Arc<dyn Backend>)> {
    match config.engine().parse::<EngineKind>() {
        Ok(kind) => match factory(kind, &config.backend_settings(kind)) {
            Ok(backend) if kind == EngineKind::DEFAULT || backend.validate_config() => {
                return Ok((kind, backend));
            }
            Ok(_) => warn!("{} is not configured, falling back to {}", kind, EngineKind::DEFAULT),
            Err(e) if kind == EngineKind::DEFAULT => return Err(e),
            Err(e) => warn!("Failed to initialize {}: {}, falling back to {}", kind, e, EngineKind::DEFAULT),
        },
        Err(e) => warn!("{}, falling back to {}", e, EngineKind::DEFAULT),
    }

    let kind = EngineKind::DEFAULT;
    let backend = factory(kind, &config.backend_settings(kind))?;
    Ok((kind, backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::languages;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Backend for Echo {
        fn info(&self) -> BackendInfo {
            BackendInfo {
                name: "Echo",
                requires_api_key: false,
                supports_auto_detect: true,
            }
        }

        async fn detect_language(&self, _text: &str) -> Result<Option<Lang>> {
            Ok(Some(Lang::new("es")))
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            Ok(format!("{}\n\n", text.to_uppercase()))
        }

        fn supported_languages(&self) -> &'static LanguageTable {
            &languages::DEEPL
        }

        fn validate_config(&self) -> bool {
            true
        }
    }

    fn engine() -> TranslationEngine {
        TranslationEngine::with_backend(EngineKind::Google, Arc::new(Echo), AppConfig::default())
    }

    #[tokio::test]
    async fn test_translate_normalizes_both_sides() {
        let result = engine()
            .translate_text("line1\n\nline2\n", &Lang::new("es"), &Lang::new("en"), true)
            .await
            .unwrap();
        assert_eq!(result.original, "line1\nline2");
        assert_eq!(result.translated, "LINE1\nLINE2");
        assert!(!result.cached);
    }

    #[tokio::test]
    async fn test_cache_disabled_in_config() {
        let mut config = AppConfig::default();
        config.cache_enabled = false;
        let engine = TranslationEngine::with_backend(EngineKind::Google, Arc::new(Echo), config);

        let (es, en) = (Lang::new("es"), Lang::new("en"));
        engine.translate_text("Hola", &es, &en, true).await.unwrap();
        let second = engine.translate_text("Hola", &es, &en, true).await.unwrap();
        assert!(!second.cached);
    }

    #[test]
    fn test_validate_languages() {
        let engine = engine();
        assert!(engine.validate_languages(&Lang::auto(), &Lang::new("en-gb")).is_ok());
        assert!(matches!(
            engine.validate_languages(&Lang::new("ja"), &Lang::auto()),
            Err(Error::UnsupportedLanguage { .. })
        ));
        assert!(matches!(
            engine.validate_languages(&Lang::new("haw"), &Lang::new("en")),
            Err(Error::UnsupportedLanguage { ref code, .. }) if code == "haw"
        ));
    }

    #[test]
    fn test_supported_languages_for_other_engine() {
        let engine = engine();
        assert!(engine.supported_languages_for("google").unwrap().contains("haw"));
        assert!(matches!(
            engine.supported_languages_for("bogus"),
            Err(Error::UnknownEngine(_))
        ));
    }

    #[test]
    fn test_reading_unavailable_without_converter() {
        let mut engine = engine();
        assert_eq!(engine.japanese_reading("ひらがな", ReadingMode::Romaji), None);

        engine.setup_reading_converter();
        assert_eq!(
            engine.japanese_reading("ひらがな", ReadingMode::Romaji).as_deref(),
            Some("hiragana")
        );
    }

    #[test]
    fn test_unknown_configured_engine_falls_back() {
        let mut config = AppConfig::default();
        config.engine = "bogus".to_string();
        let engine = TranslationEngine::new(config).unwrap();
        assert_eq!(engine.active_engine(), EngineKind::Google);
    }
}
