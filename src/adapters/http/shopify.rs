use crate::adapters::http::ensure_success;
use crate::domain::model::{SalesChannel, SalesFigures};
use crate::domain::period::Period;
use crate::domain::ports::SalesSource;
use crate::utils::error::Result;
use crate::utils::money::{de_amount, de_quantity};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::LINK;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "Shopify";

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyOrder {
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default, deserialize_with = "de_amount")]
    pub total_price: f64,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyLineItem {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de_quantity")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "de_amount")]
    pub price: f64,
}

impl ShopifyOrder {
    /// 退款與作廢的訂單不算營收
    pub fn counts_as_sale(&self) -> bool {
        !matches!(
            self.financial_status.as_deref(),
            Some("refunded") | Some("voided")
        )
    }
}

#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    orders: Vec<ShopifyOrder>,
}

/// Online orders from the Shopify Admin REST API.
pub struct ShopifyFetcher {
    client: Client,
    base_url: String,
    api_version: String,
    access_token: String,
    page_size: usize,
}

impl ShopifyFetcher {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
            access_token: access_token.into(),
            page_size,
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/admin/api/{}/orders.json", self.base_url, self.api_version)
    }

    /// All non-refunded, non-voided orders created within `[start, end]`.
    pub async fn fetch_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShopifyOrder>> {
        let mut url = self.orders_url();
        let mut first_page = true;
        let mut all_orders = Vec::new();

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("X-Shopify-Access-Token", &self.access_token);

            // 後續頁面的 next 連結已帶 page_info，不能再加篩選參數
            if first_page {
                request = request.query(&[
                    ("status", "any".to_string()),
                    (
                        "created_at_min",
                        start.to_rfc3339_opts(SecondsFormat::Secs, false),
                    ),
                    (
                        "created_at_max",
                        end.to_rfc3339_opts(SecondsFormat::Secs, false),
                    ),
                    ("limit", self.page_size.to_string()),
                ]);
            }

            tracing::debug!("📡 Shopify: GET {}", url);
            let response = ensure_success(SERVICE, request.send().await?).await?;
            let next_url = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);

            let page: OrdersPage = response.json().await?;
            let page_len = page.orders.len();
            all_orders.extend(page.orders);

            if page_len < self.page_size {
                break;
            }
            match next_url {
                Some(next) => {
                    url = next;
                    first_page = false;
                }
                None => break,
            }
        }

        let fetched = all_orders.len();
        all_orders.retain(ShopifyOrder::counts_as_sale);
        tracing::info!(
            "📡 Shopify: fetched {} orders, {} kept after refund/void filter",
            fetched,
            all_orders.len()
        );
        Ok(all_orders)
    }
}

/// The `rel="next"` target of an RFC 8288 `Link` header.
pub fn parse_next_link(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .find(|part| part.contains(r#"rel="next""#))
        .and_then(|part| part.split(';').next())
        .map(|target| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
        .filter(|target| !target.is_empty())
}

pub fn summarize_orders(orders: &[ShopifyOrder], period: Period) -> SalesFigures {
    SalesFigures {
        channel: SalesChannel::Online,
        period,
        product: None,
        revenue: orders.iter().map(|o| o.total_price).sum(),
        count: orders.len() as u64,
    }
}

pub fn summarize_product(orders: &[ShopifyOrder], period: Period, product: &str) -> SalesFigures {
    let needle = product.to_lowercase();
    let mut units = 0_i64;
    let mut revenue = 0.0;

    for item in orders
        .iter()
        .flat_map(|o| o.line_items.iter())
        .filter(|item| item.title.to_lowercase().contains(&needle))
    {
        units += item.quantity;
        revenue += item.price * item.quantity as f64;
    }

    SalesFigures {
        channel: SalesChannel::Online,
        period,
        product: Some(product.to_string()),
        revenue,
        count: units.max(0) as u64,
    }
}

#[async_trait]
impl SalesSource for ShopifyFetcher {
    fn label(&self) -> &str {
        "Online (Shopify)"
    }

    async fn period_sales(&self, period: Period, now: DateTime<Utc>) -> Result<SalesFigures> {
        let (start, end) = period.utc_window(now);
        let orders = self.fetch_orders(start, end).await?;
        Ok(summarize_orders(&orders, period))
    }

    async fn product_sales(
        &self,
        period: Period,
        product: &str,
        now: DateTime<Utc>,
    ) -> Result<SalesFigures> {
        let (start, end) = period.utc_window(now);
        let orders = self.fetch_orders(start, end).await?;
        Ok(summarize_product(&orders, period, product))
    }
}
