use crate::domain::model::{ChannelSelector, SalesQuery};
use crate::domain::period::Period;
use serde::{Deserialize, Serialize};

/// The loose JSON shape intent parsers produce. Every field may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIntent {
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub search_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    SalesByPeriod(SalesQuery),
    SalesByProduct(SalesQuery),
    MailSearch { query: Option<String> },
    CompanyInfo { topic: Option<String> },
    SupplierOutstanding { supplier: Option<String> },
    Unknown,
}

impl Intent {
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::SalesByPeriod(_) => "sales_by_period",
            Intent::SalesByProduct(_) => "sales_by_product",
            Intent::MailSearch { .. } => "gmail_search",
            Intent::CompanyInfo { .. } => "company_info",
            Intent::SupplierOutstanding { .. } => "supplier_outstanding",
            Intent::Unknown => "unknown",
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ParsedIntent {
    /// 正規化：缺少的期間為今天，缺少的通路為線上
    pub fn resolve(self) -> Intent {
        let period = Period::from_key_lenient(self.period.as_deref());
        let channel = ChannelSelector::from_key_lenient(self.channel.as_deref());
        let product = non_blank(self.product);
        let search_query = non_blank(self.search_query);

        match self.intent.as_deref().map(str::trim) {
            Some("sales_by_period") => Intent::SalesByPeriod(SalesQuery::new(period, channel)),
            Some("sales_by_product") => match product {
                Some(product) => {
                    Intent::SalesByProduct(SalesQuery::new(period, channel).with_product(product))
                }
                None => Intent::SalesByPeriod(SalesQuery::new(period, channel)),
            },
            Some("gmail_search") => Intent::MailSearch {
                query: search_query,
            },
            Some("company_info") => Intent::CompanyInfo {
                topic: search_query,
            },
            Some("supplier_outstanding") => Intent::SupplierOutstanding {
                supplier: search_query,
            },
            _ => Intent::Unknown,
        }
    }
}
