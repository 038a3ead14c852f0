use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, check_status, request_error};
use super::languages::{self, LanguageTable};
use super::prompt;
use super::traits::{Backend, BackendInfo, DETECT_PREFIX_CHARS};
use super::BackendSettings;
use crate::config::Lang;
use crate::error::{Error, Result};
use crate::util::truncate_chars;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat-completions backend.
/// Also works with any OpenAI-compatible server through `api_base`.
pub struct OpenAiBackend {
    client: Client,
    /// Base URL for the API (e.g., "https://api.openai.com/v1")
    pub api_base: String,
    /// API key (None = not configured)
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            api_base: settings
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: settings.api_key.clone(),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    async fn chat(&self, system: String, user: String, temperature: f32, max_tokens: u32) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::TranslationMissingApiKey)?;
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature,
            max_tokens,
        };

        debug!("Chat completion request to {} with model {}", url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(&e))?;
        let response = check_status(response).await?;

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::TranslationInvalidResponse("No choices in response".to_string()))
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "OpenAI",
            requires_api_key: true,
            supports_auto_detect: true,
        }
    }

    async fn detect_language(&self, text: &str) -> Result<Option<Lang>> {
        // Detection is best effort; without a key there is simply no answer
        if !self.validate_config() {
            debug!("No API key, skipping language detection");
            return Ok(None);
        }

        let prefix = truncate_chars(text, DETECT_PREFIX_CHARS);
        let reply = self
            .chat(
                prompt::DETECT_SYSTEM_PROMPT.to_string(),
                prompt::detect_user_prompt(prefix),
                0.0,
                10,
            )
            .await?;
        Ok(prompt::parse_detected(&reply, self.supported_languages()))
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let system = prompt::translate_system_prompt(self.supported_languages(), source, target);
        self.chat(system, text.to_string(), 0.3, 4096).await
    }

    fn supported_languages(&self) -> &'static LanguageTable {
        languages::OPENAI
    }

    fn validate_config(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_invalid_but_constructible() {
        let backend = OpenAiBackend::new(&BackendSettings::default()).unwrap();
        assert!(!backend.validate_config());
        assert_eq!(backend.model, DEFAULT_MODEL);
        assert_eq!(backend.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_settings_override_defaults() {
        let settings = BackendSettings {
            api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o".to_string()),
            api_base: Some("http://localhost:8080/v1".to_string()),
            ..Default::default()
        };
        let backend = OpenAiBackend::new(&settings).unwrap();
        assert!(backend.validate_config());
        assert_eq!(backend.model, "gpt-4o");
        assert_eq!(backend.api_base, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_translate_without_key_fails_before_network() {
        let backend = OpenAiBackend::new(&BackendSettings::default()).unwrap();
        let result = backend.translate("Hola", &Lang::new("es"), &Lang::new("en")).await;
        assert!(matches!(result, Err(Error::TranslationMissingApiKey)));
    }

    #[tokio::test]
    async fn test_detect_without_key_is_inconclusive() {
        let backend = OpenAiBackend::new(&BackendSettings::default()).unwrap();
        let detected = backend.detect_language("Bonjour tout le monde").await.unwrap();
        assert_eq!(detected, None);
    }
}
