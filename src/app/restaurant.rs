//! Restaurant takings from the monthly ledger spreadsheet.
//!
//! Each month has its own tab ("October 2026"). Row 3 carries one column per
//! day (`DD/MM/YYYY`); further down, the "Restaurant Sales" row holds the
//! month-to-date total in column E and the daily figures under each day.

use crate::domain::model::RestaurantSales;
use crate::domain::ports::SheetSource;
use crate::utils::error::Result;
use crate::utils::money::parse_eur;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

const DEFAULT_HEADER_RANGE: &str = "A3:AZ3";
const DEFAULT_DATA_RANGE: &str = "A200:AZ350";
const DEFAULT_TOTALS_LABEL: &str = "restaurant sales";
const LABEL_COLUMN: usize = 3;
const MTD_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TabFigures {
    pub mtd: f64,
    pub daily: Option<f64>,
}

pub struct RestaurantLedger {
    sheets: Arc<dyn SheetSource>,
    spreadsheet_id: String,
    header_range: String,
    data_range: String,
    totals_label: String,
    timezone: Tz,
}

pub fn tab_name(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

impl RestaurantLedger {
    pub fn new(sheets: Arc<dyn SheetSource>, spreadsheet_id: impl Into<String>, timezone: Tz) -> Self {
        Self {
            sheets,
            spreadsheet_id: spreadsheet_id.into(),
            header_range: DEFAULT_HEADER_RANGE.to_string(),
            data_range: DEFAULT_DATA_RANGE.to_string(),
            totals_label: DEFAULT_TOTALS_LABEL.to_string(),
            timezone,
        }
    }

    pub fn with_ranges(
        mut self,
        header_range: Option<&str>,
        data_range: Option<&str>,
        totals_label: Option<&str>,
    ) -> Self {
        if let Some(range) = header_range {
            self.header_range = range.to_string();
        }
        if let Some(range) = data_range {
            self.data_range = range.to_string();
        }
        if let Some(label) = totals_label {
            self.totals_label = label.to_lowercase();
        }
        self
    }

    /// Month-to-date from `tab`, plus the figure for `day` when asked for.
    pub async fn read_tab(&self, tab: &str, day: Option<NaiveDate>) -> Result<TabFigures> {
        let mut date_col = None;
        if let Some(day) = day {
            let wanted = day.format("%d/%m/%Y").to_string();
            let header = self
                .sheets
                .values(&self.spreadsheet_id, &format!("'{}'!{}", tab, self.header_range))
                .await?;
            date_col = header
                .first()
                .and_then(|row| row.iter().position(|cell| cell.trim() == wanted));
            if date_col.is_none() {
                tracing::warn!("Restaurant sheet: date {} not found in row 3 of {}", wanted, tab);
            }
        }

        let rows = self
            .sheets
            .values(&self.spreadsheet_id, &format!("'{}'!{}", tab, self.data_range))
            .await?;

        let totals = rows.iter().find(|row| {
            row.get(LABEL_COLUMN)
                .map(|cell| cell.to_lowercase().contains(&self.totals_label))
                .unwrap_or(false)
        });

        Ok(match totals {
            Some(row) => TabFigures {
                mtd: row.get(MTD_COLUMN).and_then(|c| parse_eur(c)).unwrap_or(0.0),
                daily: date_col.and_then(|col| row.get(col)).and_then(|c| parse_eur(c)),
            },
            None => {
                tracing::warn!("Restaurant sheet: no '{}' row in {}", self.totals_label, tab);
                TabFigures::default()
            }
        })
    }

    /// Yesterday's takings and this month's running total, in local dates.
    pub async fn sales(&self, now: DateTime<Utc>) -> Result<RestaurantSales> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let yesterday = today - Duration::days(1);
        let yesterday_tab = tab_name(yesterday);
        let current_tab = tab_name(today);

        let sales = if yesterday_tab == current_tab {
            let figures = self.read_tab(&current_tab, Some(yesterday)).await?;
            RestaurantSales {
                yesterday: figures.daily.unwrap_or(0.0),
                mtd: figures.mtd,
            }
        } else {
            // 月初：昨天在上個月的分頁
            let previous = self.read_tab(&yesterday_tab, Some(yesterday)).await?;
            let current = self.read_tab(&current_tab, None).await?;
            RestaurantSales {
                yesterday: previous.daily.unwrap_or(0.0),
                mtd: current.mtd,
            }
        };

        tracing::info!(
            "🍽️ Restaurant sales — yesterday: {:.2} MTD: {:.2}",
            sales.yesterday,
            sales.mtd
        );
        Ok(sales)
    }
}
