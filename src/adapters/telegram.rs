use crate::adapters::http::ensure_success;
use crate::domain::ports::ChatTransport;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Telegram";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Bot API over plain HTTPS: long-polling `getUpdates`, replies via `sendMessage`.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
    poll_timeout_seconds: u64,
}

impl TelegramClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        poll_timeout_seconds: u64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            poll_timeout_seconds,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn unwrap_result<T>(response: ApiResponse<T>) -> Result<T> {
        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::ProcessingError {
                message: format!(
                    "Telegram API error: {}",
                    response.description.unwrap_or_else(|| "no description".to_string())
                ),
            }),
        }
    }

    /// Blocks up to the poll timeout waiting for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[("timeout", self.poll_timeout_seconds.to_string())])
            // 長輪詢需要比 HTTP 預設逾時更久
            .timeout(std::time::Duration::from_secs(self.poll_timeout_seconds + 10));
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset.to_string())]);
        }

        let response = ensure_success(SERVICE, request.send().await?).await?;
        Self::unwrap_result(response.json::<ApiResponse<Vec<Update>>>().await?)
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        Self::unwrap_result(response.json::<ApiResponse<serde_json::Value>>().await?)?;
        Ok(())
    }
}
