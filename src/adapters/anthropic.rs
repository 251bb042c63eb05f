//! Intent parsing through the Anthropic Messages API.
//! See: https://docs.anthropic.com/en/api/messages

use crate::adapters::http::ensure_success;
use crate::domain::intent::ParsedIntent;
use crate::domain::ports::IntentParser;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeIntentParser {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    system_prompt: String,
}

impl ClaudeIntentParser {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            system_prompt: system_prompt.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    system: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// 模型偶爾會把 JSON 包在 ``` 區塊裡
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }
    let inner = text.split("```").nth(1).unwrap_or("");
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

#[async_trait]
impl IntentParser for ClaudeIntentParser {
    async fn parse(&self, message: &str) -> Result<ParsedIntent> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &self.system_prompt,
            messages: vec![RequestMessage {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let body: MessagesResponse = ensure_success(SERVICE, response).await?.json().await?;
        let text = body
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| BotError::IntentError {
                message: "model reply had no text block".to_string(),
            })?;

        tracing::debug!("Intent model reply: {}", text);
        serde_json::from_str(strip_code_fences(&text)).map_err(|e| BotError::IntentError {
            message: format!("model reply was not intent JSON: {}", e),
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences(r#"{"intent":"unknown"}"#), r#"{"intent":"unknown"}"#);
        assert_eq!(
            strip_code_fences("```json\n{\"intent\":\"unknown\"}\n```"),
            "{\"intent\":\"unknown\"}"
        );
        assert_eq!(
            strip_code_fences("  ```\n{\"intent\":\"company_info\"}```  "),
            "{\"intent\":\"company_info\"}"
        );
    }
}
