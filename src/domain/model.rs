use crate::domain::period::Period;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 實際的銷售來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Online,
    Retail,
}

impl SalesChannel {
    /// What `SalesFigures::count` means when no product filter is set.
    pub fn count_noun(&self) -> &'static str {
        match self {
            SalesChannel::Online => "Orders",
            SalesChannel::Retail => "Transactions",
        }
    }
}

/// Which channels a question asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSelector {
    #[default]
    Online,
    Retail,
    Total,
    Compare,
}

impl ChannelSelector {
    /// Missing or unrecognised selectors mean the online shop.
    pub fn from_key_lenient(key: Option<&str>) -> ChannelSelector {
        key.and_then(|k| k.parse().ok()).unwrap_or_default()
    }

    pub fn is_multi_channel(&self) -> bool {
        matches!(self, ChannelSelector::Total | ChannelSelector::Compare)
    }
}

impl FromStr for ChannelSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(ChannelSelector::Online),
            "retail" => Ok(ChannelSelector::Retail),
            "total" => Ok(ChannelSelector::Total),
            "compare" => Ok(ChannelSelector::Compare),
            other => Err(format!("unknown channel '{}'", other)),
        }
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            ChannelSelector::Online => "online",
            ChannelSelector::Retail => "retail",
            ChannelSelector::Total => "total",
            ChannelSelector::Compare => "compare",
        };
        f.write_str(key)
    }
}

/// "sales for period P, channel C, optional product filter F"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesQuery {
    pub period: Period,
    pub channel: ChannelSelector,
    pub product: Option<String>,
}

impl SalesQuery {
    pub fn new(period: Period, channel: ChannelSelector) -> Self {
        Self {
            period,
            channel,
            product: None,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }
}

/// One channel's normalized answer. `count` is orders/transactions for a plain
/// period query and units sold when `product` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFigures {
    pub channel: SalesChannel,
    pub period: Period,
    pub product: Option<String>,
    pub revenue: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RestaurantSales {
    pub yesterday: f64,
    pub mtd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierInvoice {
    pub date: String,
    pub invoice: String,
    pub amount: f64,
    pub due: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierStatement {
    pub supplier: String,
    pub total_balance: f64,
    pub total_due: f64,
    pub invoices: Vec<SupplierInvoice>,
}

impl SupplierStatement {
    pub fn unpaid(&self) -> impl Iterator<Item = &SupplierInvoice> {
        self.invoices.iter().filter(|inv| inv.balance > 0.0)
    }

    pub fn credit_notes(&self) -> impl Iterator<Item = &SupplierInvoice> {
        self.invoices.iter().filter(|inv| inv.balance < 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SupplierLookup {
    Found(SupplierStatement),
    NotFound { query: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailHit {
    pub subject: String,
    pub from: String,
    pub date: String,
    pub link: String,
}

/// Hits per inbox, in configured inbox order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSearchResults {
    pub query: String,
    pub inboxes: Vec<(String, Vec<EmailHit>)>,
}

impl MailSearchResults {
    pub fn is_empty(&self) -> bool {
        self.inboxes.iter().all(|(_, hits)| hits.is_empty())
    }
}

/// Legal and banking details quoted back to operators on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompanyProfile {
    pub legal_name: String,
    #[serde(default)]
    pub trading_as: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub invoices_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub paypal: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub vat_id: Option<String>,
    #[serde(default)]
    pub trade_register: Option<String>,
    #[serde(default)]
    pub eori: Option<String>,
    #[serde(default)]
    pub managing_directors: Vec<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub bic: Option<String>,
}
