use chrono::{DateTime, Duration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::future::Future;

/// A job that fires once a day at a wall-clock time in a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    pub at: NaiveTime,
    pub timezone: Tz,
}

/// 下一次執行的 UTC 時間；夏令時間跳過的時刻順延一小時，重複的時刻取較早者
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let mut day = now.with_timezone(&tz).date_naive();
    loop {
        let local = day.and_time(at);
        let resolved = match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => tz.from_local_datetime(&(local + Duration::hours(1))).earliest(),
        };
        if let Some(run) = resolved.map(|dt| dt.with_timezone(&Utc)) {
            if run > now {
                return run;
            }
        }
        day = day + Duration::days(1);
    }
}

impl DailySchedule {
    pub fn new(at: NaiveTime, timezone: Tz) -> Self {
        Self { at, timezone }
    }

    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_run_after(now, self.at, self.timezone)
    }

    /// Runs `job` at every occurrence, forever. Each run gets its scheduled instant.
    pub async fn run_forever<F, Fut>(self, mut job: F)
    where
        F: FnMut(DateTime<Utc>) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            let now = Utc::now();
            let next = self.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(
                "⏰ Next daily report at {} ({} from now)",
                next.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M %Z"),
                humanize(wait)
            );
            tokio::time::sleep(wait).await;
            job(next).await;
        }
    }
}

fn humanize(wait: std::time::Duration) -> String {
    let minutes = wait.as_secs() / 60;
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}
