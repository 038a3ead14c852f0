use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, check_status, request_error};
use super::languages::{self, LanguageTable};
use super::traits::{Backend, BackendInfo, DETECT_PREFIX_CHARS};
use super::BackendSettings;
use crate::config::Lang;
use crate::error::{Error, Result};
use crate::util::truncate_chars;

pub const FREE_API_BASE: &str = "https://api-free.deepl.com/v2";
pub const PRO_API_BASE: &str = "https://api.deepl.com/v2";

/// DeepL backend (REST API v2)
pub struct DeepLBackend {
    client: Client,
    /// Explicit base URL; None picks the free or pro host from the key
    api_base: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

impl DeepLBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            api_base: settings.api_base.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Free-tier keys end in ":fx" and must use the free host
    pub fn api_base(&self) -> &str {
        match (&self.api_base, &self.api_key) {
            (Some(base), _) => base,
            (None, Some(key)) if key.trim().ends_with(":fx") => FREE_API_BASE,
            (None, _) => PRO_API_BASE,
        }
    }

    async fn request(&self, text: &str, source: Option<String>, target: String) -> Result<DeepLTranslation> {
        let api_key = self.api_key.as_deref().ok_or(Error::TranslationMissingApiKey)?;
        let url = format!("{}/translate", self.api_base().trim_end_matches('/'));

        let mut params = vec![("text", text.to_string()), ("target_lang", target)];
        if let Some(source) = source {
            params.push(("source_lang", source));
        }

        debug!("DeepL request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("DeepL-Auth-Key {api_key}"))
            .form(&params)
            .send()
            .await
            .map_err(|e| request_error(&e))?;
        let response = check_status(response).await?;

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        parsed
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| Error::TranslationInvalidResponse("No translation returned".to_string()))
    }
}

/// DeepL wants region-qualified targets for English and Portuguese
fn target_code(target: &Lang) -> String {
    match target.as_str().to_ascii_lowercase().as_str() {
        "en" => "EN-US".to_string(),
        "pt" => "PT-PT".to_string(),
        "zh" | "zh-cn" => "ZH".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

/// Sources are never region-qualified; `auto` lets DeepL detect
fn source_code(source: &Lang) -> Option<String> {
    if source.is_auto() {
        return None;
    }
    let primary = source.as_str().split('-').next().unwrap_or_default();
    Some(primary.to_ascii_uppercase())
}

#[async_trait]
impl Backend for DeepLBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "DeepL",
            requires_api_key: true,
            supports_auto_detect: true,
        }
    }

    /// DeepL has no detect endpoint: translate a prefix and read the detected source
    async fn detect_language(&self, text: &str) -> Result<Option<Lang>> {
        if !self.validate_config() {
            debug!("No API key, skipping language detection");
            return Ok(None);
        }

        let prefix = truncate_chars(text, DETECT_PREFIX_CHARS);
        let result = self.request(prefix, None, "EN-US".to_string()).await?;
        Ok(result
            .detected_source_language
            .and_then(|code| languages::DEEPL.resolve(&code)))
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let result = self
            .request(text, source_code(source), target_code(target))
            .await?;
        Ok(result.text)
    }

    fn supported_languages(&self) -> &'static LanguageTable {
        &languages::DEEPL
    }

    fn validate_config(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}
