//! The morning briefing: yesterday and month-to-date for every channel.

use crate::app::aggregator::Aggregator;
use crate::app::restaurant::RestaurantLedger;
use crate::domain::model::RestaurantSales;
use crate::domain::period::Period;
use crate::utils::error::Result;
use crate::utils::money::format_amount;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const UNAVAILABLE: &str = "      unavailable";

/// Figures for one briefing; `None` marks a source that gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBriefing {
    pub today: NaiveDate,
    pub retail_yesterday: Option<f64>,
    pub online_yesterday: Option<f64>,
    pub retail_mtd: Option<f64>,
    pub online_mtd: Option<f64>,
    pub restaurant: Option<RestaurantSales>,
}

fn row(label: &str, amount: Option<f64>) -> String {
    let value = match amount {
        Some(amount) => format!("€{:>10}", format_amount(amount)),
        None => UNAVAILABLE.to_string(),
    };
    format!("  {:<12}{}", label, value)
}

impl DailyBriefing {
    pub fn render(&self) -> String {
        let yesterday = self.today - ChronoDuration::days(1);
        [
            "Good morning! Daily Sales Briefing".to_string(),
            String::new(),
            format!("Yesterday ({})", yesterday.format("%d %b %Y")),
            row("Retail", self.retail_yesterday),
            row("Online", self.online_yesterday),
            row("Restaurant", self.restaurant.map(|r| r.yesterday)),
            String::new(),
            format!("Month to Date ({})", self.today.format("%B %Y")),
            row("Retail", self.retail_mtd),
            row("Online", self.online_mtd),
            row("Restaurant", self.restaurant.map(|r| r.mtd)),
        ]
        .join("\n")
    }
}

pub struct DailyReport {
    aggregator: Arc<Aggregator>,
    restaurant: Option<Arc<RestaurantLedger>>,
    timezone: Tz,
    retries: u32,
    retry_delay: Duration,
}

impl DailyReport {
    pub fn new(
        aggregator: Arc<Aggregator>,
        restaurant: Option<Arc<RestaurantLedger>>,
        timezone: Tz,
        retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            aggregator,
            restaurant,
            timezone,
            retries: retries.max(1),
            retry_delay,
        }
    }

    /// 每個來源最多重試 `retries` 次，全部失敗則回傳 None
    async fn with_retries<T, F, Fut>(&self, what: &str, mut attempt: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for n in 1..=self.retries {
            match attempt().await {
                Ok(value) => return Some(value),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Daily report fetch attempt {}/{} failed ({}): {}",
                        n,
                        self.retries,
                        what,
                        e
                    );
                    if n < self.retries {
                        tracing::info!("🔄 Retrying in {}s...", self.retry_delay.as_secs());
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        tracing::error!(
            "❌ Daily report fetch gave up after {} attempts ({})",
            self.retries,
            what
        );
        None
    }

    pub async fn compile(&self, now: DateTime<Utc>) -> DailyBriefing {
        let online = self.aggregator.online();
        let retail = self.aggregator.retail();

        let retail_yesterday = self
            .with_retries("retail yesterday", || retail.period_sales(Period::Yesterday, now))
            .await
            .map(|f| f.revenue);
        let retail_mtd = self
            .with_retries("retail this_month", || retail.period_sales(Period::ThisMonth, now))
            .await
            .map(|f| f.revenue);
        let online_yesterday = self
            .with_retries("online yesterday", || online.period_sales(Period::Yesterday, now))
            .await
            .map(|f| f.revenue);
        let online_mtd = self
            .with_retries("online this_month", || online.period_sales(Period::ThisMonth, now))
            .await
            .map(|f| f.revenue);
        let restaurant = match &self.restaurant {
            Some(ledger) => self.with_retries("restaurant", || ledger.sales(now)).await,
            None => None,
        };

        DailyBriefing {
            today: now.with_timezone(&self.timezone).date_naive(),
            retail_yesterday,
            online_yesterday,
            retail_mtd,
            online_mtd,
            restaurant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::aggregator::tests::FixedSource;
    use crate::domain::model::SalesChannel;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_render_layout() {
        let briefing = DailyBriefing {
            today: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            retail_yesterday: Some(1234.5),
            online_yesterday: Some(87.0),
            retail_mtd: None,
            online_mtd: Some(15230.75),
            restaurant: Some(RestaurantSales {
                yesterday: 980.0,
                mtd: 0.0,
            }),
        };

        let expected = "Good morning! Daily Sales Briefing\n\
\n\
Yesterday (30 Sep 2026)\n\
\x20 Retail      €  1,234.50\n\
\x20 Online      €     87.00\n\
\x20 Restaurant  €    980.00\n\
\n\
Month to Date (October 2026)\n\
\x20 Retail            unavailable\n\
\x20 Online      € 15,230.75\n\
\x20 Restaurant  €      0.00";
        assert_eq!(briefing.render(), expected);
    }

    #[tokio::test]
    async fn test_compile_retries_then_marks_unavailable() {
        let online = Arc::new(FixedSource::new(SalesChannel::Online, "Online (Shopify)", 50.0, 2));
        let retail = Arc::new(
            FixedSource::new(SalesChannel::Retail, "Retail (Flour Cloud)", 0.0, 0).failing(),
        );
        let aggregator = Arc::new(Aggregator::new(online.clone(), retail.clone()));
        let report = DailyReport::new(
            aggregator,
            None,
            chrono_tz::Europe::Berlin,
            3,
            Duration::ZERO,
        );

        let now = DateTime::parse_from_rfc3339("2026-10-18T02:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let briefing = report.compile(now).await;

        assert_eq!(briefing.today, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(briefing.online_yesterday, Some(50.0));
        assert_eq!(briefing.online_mtd, Some(50.0));
        assert_eq!(briefing.retail_yesterday, None);
        assert_eq!(briefing.restaurant, None);
        // 兩次查詢各重試三次
        assert_eq!(retail.calls.load(Ordering::SeqCst), 6);
        assert_eq!(online.calls.load(Ordering::SeqCst), 2);
        assert!(briefing.render().contains("  Retail            unavailable"));
    }
}
