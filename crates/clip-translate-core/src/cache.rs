use moka::future::Cache;

/// A translation stored under the raw clipboard text it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    /// Normalized provider output
    pub translated: String,
    /// Normalized input that was sent to the provider
    pub original: String,
}

/// Process-lifetime translation cache.
///
/// Keys are the raw input exactly as read, so inputs differing only in
/// whitespace are separate entries. Unbounded with no TTL; one cache belongs
/// to one engine and is emptied whenever the engine's backend changes.
pub struct TranslationCache {
    cache: Cache<String, CachedTranslation>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    pub async fn get(&self, raw: &str) -> Option<CachedTranslation> {
        self.cache.get(raw).await
    }

    pub async fn insert(&self, raw: impl Into<String>, value: CachedTranslation) {
        self.cache.insert(raw.into(), value).await;
    }

    /// Drop every entry. Takes effect for lookups immediately.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}
