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

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude backend (messages API)
pub struct ClaudeBackend {
    client: Client,
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeBackend {
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

    async fn message(&self, system: String, user: String, temperature: f32, max_tokens: u32) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::TranslationMissingApiKey)?;
        let url = format!("{}/messages", self.api_base.trim_end_matches('/'));

        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            system,
            messages: vec![Message { role: "user", content: user }],
        };

        debug!("Messages request to {} with model {}", url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(&e))?;
        let response = check_status(response).await?;

        let messages_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        messages_response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::TranslationInvalidResponse("No text content in response".to_string()))
    }
}

#[async_trait]
impl Backend for ClaudeBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "Claude",
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
            .message(
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
        self.message(system, text.to_string(), 0.3, 4096).await
    }

    fn supported_languages(&self) -> &'static LanguageTable {
        languages::CLAUDE
    }

    fn validate_config(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}
