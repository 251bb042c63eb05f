//! Reporting periods and the two ways channels bound them.
//!
//! The online shop filters on UTC instants, the retail till on business-local
//! calendar dates, so each period resolves to both shapes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Today,
    Yesterday,
    Last7Days,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::Today,
        Period::Yesterday,
        Period::Last7Days,
        Period::ThisWeek,
        Period::LastWeek,
        Period::ThisMonth,
        Period::LastMonth,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Last7Days => "last_7_days",
            Period::ThisWeek => "this_week",
            Period::LastWeek => "last_week",
            Period::ThisMonth => "this_month",
            Period::LastMonth => "last_month",
        }
    }

    /// 回覆訊息裡使用的描述
    pub fn label(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Last7Days => "the last 7 days",
            Period::ThisWeek => "this week (Mon → now)",
            Period::LastWeek => "last week",
            Period::ThisMonth => "this month",
            Period::LastMonth => "last month",
        }
    }

    /// Unknown or missing keys fall back to today.
    pub fn from_key_lenient(key: Option<&str>) -> Period {
        key.and_then(|k| k.parse().ok()).unwrap_or_default()
    }

    /// UTC instant bounds, both inclusive.
    pub fn utc_window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today_start = start_of_day_utc(now.date_naive());
        let one_sec = Duration::seconds(1);

        match self {
            Period::Today => (today_start, now),
            Period::Yesterday => (today_start - Duration::days(1), today_start - one_sec),
            Period::Last7Days => (now - Duration::days(7), now),
            Period::ThisWeek => (today_start - days_since_monday(now.date_naive()), now),
            Period::LastWeek => {
                let this_monday = today_start - days_since_monday(now.date_naive());
                (this_monday - Duration::days(7), this_monday - one_sec)
            }
            Period::ThisMonth => (start_of_day_utc(first_of_month(now.date_naive())), now),
            Period::LastMonth => {
                let first_of_this = start_of_day_utc(first_of_month(now.date_naive()));
                let last_month_end = first_of_this - one_sec;
                let first_of_last = start_of_day_utc(first_of_month(last_month_end.date_naive()));
                (first_of_last, last_month_end)
            }
        }
    }

    /// Inclusive calendar dates in the business timezone.
    pub fn local_dates(&self, now: DateTime<Utc>, tz: Tz) -> (NaiveDate, NaiveDate) {
        let today = now.with_timezone(&tz).date_naive();

        match self {
            Period::Today => (today, today),
            Period::Yesterday => {
                let yesterday = today - Duration::days(1);
                (yesterday, yesterday)
            }
            Period::Last7Days => (today - Duration::days(7), today),
            Period::ThisWeek => (today - days_since_monday(today), today),
            Period::LastWeek => {
                let this_monday = today - days_since_monday(today);
                (this_monday - Duration::days(7), this_monday - Duration::days(1))
            }
            Period::ThisMonth => (first_of_month(today), today),
            Period::LastMonth => {
                let last_month_last = first_of_month(today) - Duration::days(1);
                (first_of_month(last_month_last), last_month_last)
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.key() == key)
            .ok_or_else(|| format!("unknown period '{}'", s))
    }
}

fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn days_since_monday(date: NaiveDate) -> Duration {
    Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Berlin;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_period_parsing_is_lenient() {
        assert_eq!("last_week".parse::<Period>().unwrap(), Period::LastWeek);
        assert_eq!(" This_Month ".parse::<Period>().unwrap(), Period::ThisMonth);
        assert!("fortnight".parse::<Period>().is_err());
        assert_eq!(Period::from_key_lenient(Some("fortnight")), Period::Today);
        assert_eq!(Period::from_key_lenient(None), Period::Today);
    }

    #[test]
    fn test_utc_window_yesterday_and_weeks() {
        // Sunday 18 Oct 2026
        let now = at("2026-10-18T15:30:00Z");

        let (start, end) = Period::Yesterday.utc_window(now);
        assert_eq!(start, at("2026-10-17T00:00:00Z"));
        assert_eq!(end, at("2026-10-17T23:59:59Z"));

        let (start, end) = Period::ThisWeek.utc_window(now);
        assert_eq!(start, at("2026-10-12T00:00:00Z"));
        assert_eq!(end, now);

        let (start, end) = Period::LastWeek.utc_window(now);
        assert_eq!(start, at("2026-10-05T00:00:00Z"));
        assert_eq!(end, at("2026-10-11T23:59:59Z"));

        let (start, _) = Period::Last7Days.utc_window(now);
        assert_eq!(start, at("2026-10-11T15:30:00Z"));
    }

    #[test]
    fn test_utc_window_last_month_crosses_year() {
        let now = at("2026-01-10T08:00:00Z");
        let (start, end) = Period::LastMonth.utc_window(now);
        assert_eq!(start, at("2025-12-01T00:00:00Z"));
        assert_eq!(end, at("2025-12-31T23:59:59Z"));

        let (start, end) = Period::ThisMonth.utc_window(now);
        assert_eq!(start, at("2026-01-01T00:00:00Z"));
        assert_eq!(end, now);
    }

    #[test]
    fn test_local_dates_use_business_timezone() {
        // 23:30 UTC on the 31st is already 1 Nov in Berlin (CET, +1)
        let now = at("2026-10-31T23:30:00Z");

        assert_eq!(
            Period::Today.local_dates(now, Berlin),
            (date("2026-11-01"), date("2026-11-01"))
        );
        assert_eq!(
            Period::Yesterday.local_dates(now, Berlin),
            (date("2026-10-31"), date("2026-10-31"))
        );
        assert_eq!(
            Period::LastMonth.local_dates(now, Berlin),
            (date("2026-10-01"), date("2026-10-31"))
        );
    }

    #[test]
    fn test_local_dates_last_week_is_monday_to_sunday() {
        let now = at("2026-10-14T10:00:00Z"); // Wednesday
        assert_eq!(
            Period::LastWeek.local_dates(now, Berlin),
            (date("2026-10-05"), date("2026-10-11"))
        );
        assert_eq!(
            Period::Last7Days.local_dates(now, Berlin),
            (date("2026-10-07"), date("2026-10-14"))
        );
    }

    #[test]
    fn test_windows_are_ordered() {
        let now = at("2026-03-01T00:00:05Z");
        for period in Period::ALL {
            let (start, end) = period.utc_window(now);
            assert!(start <= end, "{} utc window inverted", period);
            assert!(end <= now);
            let (first, last) = period.local_dates(now, Berlin);
            assert!(first <= last, "{} local dates inverted", period);
        }
    }
}
