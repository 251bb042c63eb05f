pub mod flour_cloud;
pub mod shopify;

use crate::utils::error::{BotError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

pub use flour_cloud::FlourCloudFetcher;
pub use shopify::ShopifyFetcher;

pub fn build_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

/// 非 2xx 的回應轉成 UpstreamError，保留回應內容方便除錯
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} request failed with status {}: {}", service, status, body);
    Err(BotError::upstream(service, status, body))
}
