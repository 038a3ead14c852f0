//! Prompts shared by the LLM-backed providers.

use super::languages::LanguageTable;
use crate::config::Lang;

pub const DETECT_SYSTEM_PROMPT: &str = "You are a language detection system. \
Respond with ONLY the ISO 639-1 language code (e.g., 'en', 'es', 'ja'). \
If unsure, respond with 'unknown'.";

pub fn detect_user_prompt(text: &str) -> String {
    format!("What language is this text written in? Text: {text}")
}

/// System prompt asking for a verbatim translation with no commentary
pub fn translate_system_prompt(table: &LanguageTable, source: &Lang, target: &Lang) -> String {
    let source_hint = if source.is_auto() {
        String::new()
    } else {
        format!(" from {}", table.name(source.as_str()).unwrap_or(source.as_str()))
    };
    format!(
        "You are a professional translator. Translate text{} to {}. \
         Maintain the original formatting and style. Only provide the translation, no explanations.",
        source_hint,
        table.name(target.as_str()).unwrap_or(target.as_str())
    )
}

/// Interpret a detection reply; anything outside the table is inconclusive
pub fn parse_detected(reply: &str, table: &LanguageTable) -> Option<Lang> {
    let code = reply
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .to_lowercase();
    table.resolve(&code)
}
