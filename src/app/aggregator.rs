use crate::domain::model::{ChannelSelector, SalesFigures, SalesQuery};
use crate::domain::period::Period;
use crate::domain::ports::SalesSource;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A channel's figures with the label it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFigures {
    pub label: String,
    pub figures: SalesFigures,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SalesAnswer {
    /// One channel, whole period or one product.
    Single(LabeledFigures),
    /// Both channels summed, with the breakdown.
    Total {
        online: LabeledFigures,
        retail: LabeledFigures,
    },
    /// Both channels side by side.
    Comparison {
        online: LabeledFigures,
        retail: LabeledFigures,
    },
    /// One product across both channels.
    ProductAcrossChannels {
        online: LabeledFigures,
        retail: LabeledFigures,
    },
}

impl SalesAnswer {
    pub fn period(&self) -> Period {
        match self {
            SalesAnswer::Single(single) => single.figures.period,
            SalesAnswer::Total { online, .. }
            | SalesAnswer::Comparison { online, .. }
            | SalesAnswer::ProductAcrossChannels { online, .. } => online.figures.period,
        }
    }

    pub fn combined_revenue(&self) -> f64 {
        match self {
            SalesAnswer::Single(single) => single.figures.revenue,
            SalesAnswer::Total { online, retail }
            | SalesAnswer::Comparison { online, retail }
            | SalesAnswer::ProductAcrossChannels { online, retail } => {
                online.figures.revenue + retail.figures.revenue
            }
        }
    }
}

/// Fans a [`SalesQuery`] out to the channel fetchers and shapes the result.
pub struct Aggregator {
    online: Arc<dyn SalesSource>,
    retail: Arc<dyn SalesSource>,
}

impl Aggregator {
    pub fn new(online: Arc<dyn SalesSource>, retail: Arc<dyn SalesSource>) -> Self {
        Self { online, retail }
    }

    pub fn online(&self) -> &Arc<dyn SalesSource> {
        &self.online
    }

    pub fn retail(&self) -> &Arc<dyn SalesSource> {
        &self.retail
    }

    async fn fetch(
        source: &Arc<dyn SalesSource>,
        query: &SalesQuery,
        now: DateTime<Utc>,
    ) -> Result<LabeledFigures> {
        let figures = match &query.product {
            Some(product) => source.product_sales(query.period, product, now).await?,
            None => source.period_sales(query.period, now).await?,
        };
        Ok(LabeledFigures {
            label: source.label().to_string(),
            figures,
        })
    }

    pub async fn answer(&self, query: &SalesQuery, now: DateTime<Utc>) -> Result<SalesAnswer> {
        tracing::info!(
            "📊 Sales query: period={} channel={} product={:?}",
            query.period,
            query.channel,
            query.product
        );

        if !query.channel.is_multi_channel() {
            let source = match query.channel {
                ChannelSelector::Retail => &self.retail,
                _ => &self.online,
            };
            return Ok(SalesAnswer::Single(Self::fetch(source, query, now).await?));
        }

        let (online, retail) = tokio::try_join!(
            Self::fetch(&self.online, query, now),
            Self::fetch(&self.retail, query, now)
        )?;

        Ok(match (&query.product, query.channel) {
            (Some(_), _) => SalesAnswer::ProductAcrossChannels { online, retail },
            (None, ChannelSelector::Compare) => SalesAnswer::Comparison { online, retail },
            (None, _) => SalesAnswer::Total { online, retail },
        })
    }
}
