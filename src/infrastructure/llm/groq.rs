//! Overlay text formatting through Groq's OpenAI-compatible chat API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{FormattedText, TextFormatter};
use crate::common::error::{AppError, AppResult};
use crate::config::settings::AppConfig;

const TOOL: &str = "text formatter";

const SYSTEM_PROMPT: &str = "You format captions for vertical social media videos. \
Given raw text, respond with a JSON object with two string fields: \
\"title\", a short punchy headline of at most 8 words, and \"body\", \
the text rewritten for on-screen reading with short lines separated by \
newlines. Keep the original language and meaning. Do not add hashtags \
or emojis. Respond with JSON only.";

#[derive(Clone)]
pub struct GroqFormatter {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl GroqFormatter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
            endpoint: format!("{}/chat/completions", config.groq_api_url.trim_end_matches('/')),
        }
    }
}

/// Reads the model reply. Anything other than a JSON object degrades to the
/// raw text; a missing `body` falls back to the raw text, a missing `title`
/// to empty.
pub fn parse_reply(content: &str, raw: &str) -> FormattedText {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(json) else {
        warn!("Formatter reply was not a JSON object, using raw text");
        return FormattedText::passthrough(raw);
    };

    let field = |key: &str| obj.get(key).and_then(Value::as_str).map(|s| s.trim().to_string());

    FormattedText {
        title: field("title").unwrap_or_default(),
        body: field("body").unwrap_or_else(|| raw.trim().to_string()),
    }
}

#[async_trait]
impl TextFormatter for GroqFormatter {
    async fn format(&self, raw: &str) -> AppResult<FormattedText> {
        if raw.trim().is_empty() {
            return Ok(FormattedText::default());
        }

        let Some(api_key) = &self.api_key else {
            debug!("No GROQ_API_KEY configured, overlay text passed through");
            return Ok(FormattedText::passthrough(raw));
        };

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: raw },
            ],
            temperature: 0.3,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::tool(TOOL, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Formatter returned {}: {}", status, body);
            return Err(AppError::tool(TOOL, format!("HTTP {}", status)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::tool(TOOL, format!("unreadable response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(parse_reply(&content, raw))
    }
}
