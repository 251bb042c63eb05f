use crate::adapters::http::ensure_success;
use crate::domain::model::{SalesChannel, SalesFigures};
use crate::domain::period::Period;
use crate::domain::ports::SalesSource;
use crate::utils::error::Result;
use crate::utils::money::value_as_f64;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde_json::Value;

const SERVICE: &str = "Flour Cloud";

/// A retail receipt (`type=R`) with its line items left as raw JSON.
#[derive(Debug, Clone)]
pub struct RetailDocument {
    pub date: Option<NaiveDate>,
    pub items: Vec<Value>,
}

impl RetailDocument {
    fn from_value(doc: &Value) -> Self {
        Self {
            date: document_date(doc),
            items: doc
                .get("items")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn live_items(&self) -> impl Iterator<Item = &Value> {
        self.items
            .iter()
            .filter(|item| !item.get("cancelled").and_then(Value::as_bool).unwrap_or(false))
    }
}

/// 文件日期是柏林當地日期，只取前 10 個字元
pub fn document_date(doc: &Value) -> Option<NaiveDate> {
    let raw = match doc.get("date")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let prefix: String = raw.chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d").ok()
}

/// The list of documents, whether the API wrapped it or not.
pub fn documents_in(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => ["docs", "documents", "data"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(items)) if !items.is_empty() => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Retail till receipts from the Flour Cloud POS.
pub struct FlourCloudFetcher {
    client: Client,
    base_url: String,
    token: String,
    page_size: usize,
    timezone: Tz,
}

impl FlourCloudFetcher {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        page_size: usize,
        timezone: Tz,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            page_size,
            timezone,
        }
    }

    /// Receipts dated within `[start, end]`, walking pages newest first.
    pub async fn fetch_documents(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RetailDocument>> {
        let url = format!("{}/v3/documents", self.base_url);
        let mut all_docs = Vec::new();
        let mut skip = 0_usize;

        loop {
            tracing::debug!("📡 Flour Cloud: GET {} skip={}", url, skip);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[
                    ("limit", self.page_size.to_string()),
                    ("type", "R".to_string()),
                    ("sort", "-date".to_string()),
                    ("skip", skip.to_string()),
                ])
                .send()
                .await?;
            let response = ensure_success(SERVICE, response).await?;

            let page = documents_in(response.json().await?);
            if page.is_empty() {
                break;
            }
            let page_len = page.len();
            let oldest = page.last().and_then(document_date);
            all_docs.extend(page.iter().map(RetailDocument::from_value));

            // 依日期倒序，最舊的一筆早於起始日就不用再翻頁
            if matches!(oldest, Some(date) if date < start) {
                break;
            }
            if page_len < self.page_size {
                break;
            }
            skip += self.page_size;
        }

        let fetched = all_docs.len();
        all_docs.retain(|doc| matches!(doc.date, Some(date) if start <= date && date <= end));
        tracing::info!(
            "📡 Flour Cloud: fetched {} docs, {} within {} → {} ({})",
            fetched,
            all_docs.len(),
            start,
            end,
            self.timezone
        );
        Ok(all_docs)
    }
}

pub fn summarize_documents(docs: &[RetailDocument], period: Period) -> SalesFigures {
    let revenue = docs
        .iter()
        .flat_map(RetailDocument::live_items)
        .map(|item| item.get("totalIncVat").map(value_as_f64).unwrap_or(0.0))
        .sum();

    SalesFigures {
        channel: SalesChannel::Retail,
        period,
        product: None,
        revenue,
        count: docs.len() as u64,
    }
}

pub fn summarize_product(docs: &[RetailDocument], period: Period, product: &str) -> SalesFigures {
    let needle = product.to_lowercase();
    let mut units = 0_i64;
    let mut revenue = 0.0;

    for item in docs.iter().flat_map(RetailDocument::live_items) {
        let title = match item.get("title") {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(other) => other.to_string().to_lowercase(),
            None => continue,
        };
        if !title.contains(&needle) {
            continue;
        }
        units += item.get("amount").map(value_as_f64).unwrap_or(0.0) as i64;
        revenue += item.get("totalIncVat").map(value_as_f64).unwrap_or(0.0);
    }

    SalesFigures {
        channel: SalesChannel::Retail,
        period,
        product: Some(product.to_string()),
        revenue,
        count: units.max(0) as u64,
    }
}

#[async_trait]
impl SalesSource for FlourCloudFetcher {
    fn label(&self) -> &str {
        "Retail (Flour Cloud)"
    }

    async fn period_sales(&self, period: Period, now: DateTime<Utc>) -> Result<SalesFigures> {
        let (start, end) = period.local_dates(now, self.timezone);
        let docs = self.fetch_documents(start, end).await?;
        Ok(summarize_documents(&docs, period))
    }

    async fn product_sales(
        &self,
        period: Period,
        product: &str,
        now: DateTime<Utc>,
    ) -> Result<SalesFigures> {
        let (start, end) = period.local_dates(now, self.timezone);
        let docs = self.fetch_documents(start, end).await?;
        Ok(summarize_product(&docs, period, product))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_documents_in_accepts_wrapped_and_bare_lists() {
        assert_eq!(documents_in(json!([{"date": "2026-10-01"}])).len(), 1);
        assert_eq!(documents_in(json!({"docs": [{}, {}]})).len(), 2);
        assert_eq!(documents_in(json!({"documents": [{}]})).len(), 1);
        assert_eq!(documents_in(json!({"data": [{}, {}, {}]})).len(), 3);
        assert!(documents_in(json!({"total": 0})).is_empty());
        assert!(documents_in(json!("nope")).is_empty());
    }

    #[test]
    fn test_document_date_takes_calendar_prefix() {
        let date = document_date(&json!({"date": "2026-10-17T22:15:00.000Z"}));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 17));
        assert_eq!(document_date(&json!({"date": "yesterday"})), None);
        assert_eq!(document_date(&json!({})), None);
    }

    #[test]
    fn test_cancelled_items_are_skipped() {
        let docs: Vec<RetailDocument> = [
            json!({"date": "2026-10-17", "items": [
                {"title": "Mishti Doi", "amount": 2, "totalIncVat": 6.0},
                {"title": "Mishti Doi", "amount": 1, "totalIncVat": 3.0, "cancelled": true},
                {"title": "Paneer", "amount": 1, "totalIncVat": "4.50"}
            ]}),
            json!({"date": "2026-10-17", "items": [
                {"title": "mishti doi large", "amount": "1", "totalIncVat": 5.0}
            ]}),
        ]
        .iter()
        .map(RetailDocument::from_value)
        .collect();

        let totals = summarize_documents(&docs, Period::Yesterday);
        assert_eq!(totals.count, 2);
        assert!((totals.revenue - 15.5).abs() < 1e-9);

        let mishti = summarize_product(&docs, Period::Yesterday, "Mishti");
        assert_eq!(mishti.count, 3);
        assert!((mishti.revenue - 11.0).abs() < 1e-9);
    }
}
