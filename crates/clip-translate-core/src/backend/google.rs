use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http::{build_client, check_status, request_error};
use super::languages::{self, LanguageTable};
use super::traits::{Backend, BackendInfo, DETECT_PREFIX_CHARS};
use super::BackendSettings;
use crate::config::Lang;
use crate::error::{Error, Result};
use crate::util::truncate_chars;

/// Free web endpoint used by translate.google.com widgets
pub const DEFAULT_API_BASE: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate via the free web endpoint. Needs no credentials.
pub struct GoogleBackend {
    client: Client,
    /// Endpoint URL (overridable for testing against a proxy)
    pub api_base: String,
}

/// Parsed reply of the web endpoint
#[derive(Debug, PartialEq, Eq)]
struct WebReply {
    text: String,
    detected: Option<String>,
}

impl GoogleBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            api_base: settings
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    async fn query(&self, text: &str, source: &str, target: &str) -> Result<WebReply> {
        let url = format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.api_base,
            source,
            target,
            urlencoding::encode(text)
        );
        debug!("Google request {} -> {} ({} chars)", source, target, text.chars().count());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(&e))?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;
        parse_reply(&body)
    }
}

/// Pull the translated segments and detected language out of the nested array
fn parse_reply(body: &str) -> Result<WebReply> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| Error::TranslationInvalidResponse(format!("Failed to parse JSON: {e}")))?;

    let segments = json.get(0).and_then(Value::as_array).ok_or_else(|| {
        Error::TranslationInvalidResponse("missing segment array at index 0".to_string())
    })?;

    let text = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect::<String>();

    let detected = json.get(2).and_then(Value::as_str).map(str::to_string);

    Ok(WebReply { text, detected })
}

/// Wire spelling of a language code (the endpoint wants `zh-CN`, not `zh-cn`)
fn wire_code(lang: &Lang) -> String {
    match lang.as_str().to_ascii_lowercase().as_str() {
        "zh" | "zh-cn" => "zh-CN".to_string(),
        "zh-tw" => "zh-TW".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Backend for GoogleBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: "Google Translate",
            requires_api_key: false,
            supports_auto_detect: true,
        }
    }

    async fn detect_language(&self, text: &str) -> Result<Option<Lang>> {
        let prefix = truncate_chars(text.trim(), DETECT_PREFIX_CHARS);
        if prefix.is_empty() {
            return Ok(None);
        }

        let reply = self.query(prefix, "auto", "en").await?;
        Ok(reply
            .detected
            .and_then(|code| languages::GOOGLE.resolve(&code)))
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let reply = self.query(text, &wire_code(source), &wire_code(target)).await?;
        if reply.text.trim().is_empty() {
            return Err(Error::TranslationInvalidResponse(
                "empty translation received".to_string(),
            ));
        }
        Ok(reply.text)
    }

    fn supported_languages(&self) -> &'static LanguageTable {
        &languages::GOOGLE
    }

    fn validate_config(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_joins_segments() {
        let body = r#"[[["Hello. ","Hola. ",null,null,10],["How are you?","¿Cómo estás?",null,null,10]],null,"es",null,null,null,1.0]"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.text, "Hello. How are you?");
        assert_eq!(reply.detected.as_deref(), Some("es"));
    }

    #[test]
    fn test_parse_reply_rejects_unexpected_shape() {
        assert!(matches!(
            parse_reply(r#"{"error": "nope"}"#),
            Err(Error::TranslationInvalidResponse(_))
        ));
        assert!(parse_reply("not json").is_err());
    }

    #[test]
    fn test_wire_code() {
        assert_eq!(wire_code(&Lang::new("zh-cn")), "zh-CN");
        assert_eq!(wire_code(&Lang::new("zh-TW")), "zh-TW");
        assert_eq!(wire_code(&Lang::new("JA")), "ja");
        assert_eq!(wire_code(&Lang::auto()), "auto");
    }

    #[test]
    fn test_always_valid() {
        let backend = GoogleBackend::new(&BackendSettings::default()).unwrap();
        assert!(backend.validate_config());
        assert!(backend.supported_languages().contains("ja"));
    }
}
