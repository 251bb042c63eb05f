use crate::adapters::http::ensure_success;
use crate::domain::ports::{AccessTokenProvider, SheetSource};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use super::auth::SHEETS_READONLY_SCOPE;

const SERVICE: &str = "Google Sheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Sheets API v4, read-only.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl SheetsClient {
    pub fn new(client: Client, base_url: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            tokens,
        }
    }

    /// `{base}/v4/spreadsheets/{id}[/values/{range}]` with each segment percent-encoded.
    fn spreadsheet_url(&self, spreadsheet_id: &str, range: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| BotError::InvalidConfigValueError {
            field: "google.sheets_base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| BotError::ConfigError {
                message: format!("{} cannot be a base URL", self.base_url),
            })?;
            segments.pop_if_empty().extend(["v4", "spreadsheets", spreadsheet_id]);
            if let Some(range) = range {
                segments.extend(["values", range]);
            }
        }
        Ok(url)
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetSource for SheetsClient {
    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.spreadsheet_url(spreadsheet_id, Some(range))?;
        let token = self.tokens.access_token(SHEETS_READONLY_SCOPE, None).await?;

        tracing::debug!("📡 Sheets: GET {}", url);
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = ensure_success(SERVICE, response).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn tab_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = self.spreadsheet_url(spreadsheet_id, None)?;
        let token = self.tokens.access_token(SHEETS_READONLY_SCOPE, None).await?;

        let response = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(token)
            .send()
            .await?;
        let meta: SpreadsheetMeta = ensure_success(SERVICE, response).await?.json().await?;

        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::google::auth::StaticToken;

    #[test]
    fn test_range_is_encoded_as_one_segment() {
        let client = SheetsClient::new(
            Client::new(),
            "https://sheets.googleapis.com",
            Arc::new(StaticToken("t".to_string())),
        );
        let url = client
            .spreadsheet_url("abc123", Some("'October 2026'!A3:AZ3"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'October%202026'!A3:AZ3"
        );

        let meta = client.spreadsheet_url("abc123", None).unwrap();
        assert_eq!(meta.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(serde_json::json!("€1,200.00")), "€1,200.00");
        assert_eq!(cell_text(serde_json::json!(12.5)), "12.5");
        assert_eq!(cell_text(serde_json::json!(null)), "");
    }
}
