use crate::domain::intent::ParsedIntent;
use crate::domain::model::{EmailHit, SalesFigures};
use crate::domain::period::Period;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One sales channel behind the canonical `{period, product} -> {revenue, count}` contract.
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Display name, e.g. "Online (Shopify)".
    fn label(&self) -> &str;

    async fn period_sales(&self, period: Period, now: DateTime<Utc>) -> Result<SalesFigures>;

    async fn product_sales(
        &self,
        period: Period,
        product: &str,
        now: DateTime<Utc>,
    ) -> Result<SalesFigures>;
}

/// Read-only access to spreadsheet cells as displayed strings.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;

    async fn tab_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn search(&self, inbox: &str, query: &str, max_results: usize) -> Result<Vec<EmailHit>>;
}

#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse(&self, message: &str) -> Result<ParsedIntent>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// OAuth bearer tokens, optionally impersonating `subject`.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self, scope: &str, subject: Option<&str>) -> Result<String>;
}
