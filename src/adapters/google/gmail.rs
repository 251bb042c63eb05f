use crate::adapters::http::ensure_success;
use crate::domain::model::EmailHit;
use crate::domain::ports::{AccessTokenProvider, Mailbox};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::auth::GMAIL_READONLY_SCOPE;

const SERVICE: &str = "Gmail";

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

/// Gmail API v1, acting as each inbox through domain-wide delegation.
pub struct GmailClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl GmailClient {
    pub fn new(client: Client, base_url: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn message_hit(&self, token: &str, id: &str) -> Result<EmailHit> {
        let url = format!("{}/gmail/v1/users/me/messages/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ])
            .send()
            .await?;
        let detail: MessageDetail = ensure_success(SERVICE, response).await?.json().await?;

        let headers: HashMap<String, String> = detail
            .payload
            .map(|p| p.headers)
            .unwrap_or_default()
            .into_iter()
            .map(|h| (h.name, h.value))
            .collect();

        Ok(EmailHit {
            subject: headers
                .get("Subject")
                .cloned()
                .unwrap_or_else(|| "(no subject)".to_string()),
            from: headers.get("From").cloned().unwrap_or_default(),
            date: format_email_date(headers.get("Date").map(String::as_str).unwrap_or("")),
            link: format!("https://mail.google.com/mail/u/0/#all/{}", id),
        })
    }
}

/// RFC 2822 dates become `18 Oct 2026 09:15`; anything else is shown as sent.
pub fn format_email_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.format("%d %b %Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn search(&self, inbox: &str, query: &str, max_results: usize) -> Result<Vec<EmailHit>> {
        let token = self
            .tokens
            .access_token(GMAIL_READONLY_SCOPE, Some(inbox))
            .await?;

        let url = format!("{}/gmail/v1/users/me/messages", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("q", query.to_string()), ("maxResults", max_results.to_string())])
            .send()
            .await?;
        let list: MessageList = ensure_success(SERVICE, response).await?.json().await?;

        let mut hits = Vec::with_capacity(list.messages.len());
        for message in &list.messages {
            hits.push(self.message_hit(&token, &message.id).await?);
        }
        tracing::debug!("📬 {}: {} hits for {:?}", inbox, hits.len(), query);
        Ok(hits)
    }
}
