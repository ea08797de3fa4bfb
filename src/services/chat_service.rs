use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{config::Settings, error::AppError};

use super::market_data::ProviderError;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_HISTORY_TURNS: usize = 10;

const SYSTEM_PROMPT: &str = "You are TradeBro's assistant inside a paper-trading app. \
Users trade with virtual money only. Explain market concepts, order types, fees and \
how to use the app in plain language. Keep answers short. Never give personalised \
investment advice or promise returns.";

const FALLBACK_REPLY: &str = "The assistant is not available right now. You can still search \
stocks, open live charts and place practice trades with your virtual balance.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model", alias = "bot")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub fallback: bool,
}

/// Trimmed message, or a 400 when it is empty or too long.
pub fn check_message(raw: &str) -> Result<String, AppError> {
    let msg = raw.trim();
    if msg.is_empty() {
        return Err(AppError::field("message", "Message is required."));
    }
    if msg.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::field(
            "message",
            &format!("Message is too long (max {MAX_MESSAGE_CHARS} characters)."),
        ));
    }
    Ok(msg.to_string())
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs.max(1) * 3))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_key: settings.gemini_api_key.clone(),
            model: settings.gemini_model.clone(),
            base: GEMINI_BASE.to_string(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn request_body(message: &str, history: &[ChatTurn]) -> Value {
        let start = history.len().saturating_sub(MAX_HISTORY_TURNS);

        let mut contents: Vec<Value> = history[start..]
            .iter()
            .filter(|t| !t.content.trim().is_empty())
            .map(|t| {
                let role = match t.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": t.content }] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

        json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": contents,
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 512 },
        })
    }

    async fn generate(&self, message: &str, history: &[ChatTurn]) -> Result<String, ProviderError> {
        if !self.has_key() {
            return Err(ProviderError::MissingKey("Gemini"));
        }

        let url = format!("{}/models/{}:generateContent", self.base, self.model);
        let res = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(message, history))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Http { status, body });
        }

        let v = res.json::<Value>().await?;
        let text = v
            .pointer("/candidates/0/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::Empty("chat reply".into()));
        }
        Ok(text.to_string())
    }

    /// Always answers: provider trouble yields the canned reply.
    pub async fn reply(&self, message: &str, history: &[ChatTurn]) -> ChatReply {
        match self.generate(message, history).await {
            Ok(reply) => ChatReply { reply, fallback: false },
            Err(e) => {
                tracing::warn!("chat fallback: {e}");
                ChatReply {
                    reply: FALLBACK_REPLY.to_string(),
                    fallback: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: ChatRole, content: &str) -> ChatTurn {
        ChatTurn { role, content: content.into() }
    }

    #[test]
    fn message_bounds() {
        assert!(check_message("   ").is_err());
        assert_eq!(check_message("  hi ").unwrap(), "hi");
        assert!(check_message(&"x".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(check_message(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn only_recent_history_is_sent() {
        let history: Vec<ChatTurn> = (0..15)
            .map(|i| turn(if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant }, &format!("t{i}")))
            .collect();

        let body = GeminiClient::request_body("now", &history);
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(contents[0]["parts"][0]["text"], "t5");
        assert_eq!(contents[0]["role"], "model");
        assert_eq!(contents[MAX_HISTORY_TURNS]["parts"][0]["text"], "now");
    }

    #[test]
    fn history_roles_accept_model_alias() {
        let t: ChatTurn = serde_json::from_str(r#"{"role":"model","content":"hey"}"#).unwrap();
        assert_eq!(t.role, ChatRole::Assistant);
    }
}
