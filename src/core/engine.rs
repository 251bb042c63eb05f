//! The long-running bot: Telegram long polling plus the daily briefing job.

use crate::adapters::telegram::{TelegramClient, Update};
use crate::app::assistant::Assistant;
use crate::app::report::DailyReport;
use crate::core::scheduler::DailySchedule;
use crate::domain::ports::ChatTransport;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

const POLL_BACKOFF: Duration = Duration::from_secs(5);

/// Daily briefing delivery: what to compile, where to send it, when.
pub struct BriefingJob {
    pub report: Arc<DailyReport>,
    pub chat_id: i64,
    pub schedule: DailySchedule,
}

/// A message that passed the gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted<'a> {
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub text: &'a str,
}

/// 過濾：未授權的使用者、空白訊息與 /指令 一律忽略
pub fn accept<'a>(update: &'a Update, allowed_users: &[i64]) -> Option<Accepted<'a>> {
    let message = update.message.as_ref()?;
    let user_id = message.from.as_ref().map(|sender| sender.id);

    if !allowed_users.is_empty() && !user_id.is_some_and(|id| allowed_users.contains(&id)) {
        tracing::info!("🚫 Ignoring unauthorised user {:?}", user_id);
        return None;
    }

    let text = message.text.as_deref()?.trim();
    if text.is_empty() || text.starts_with('/') {
        return None;
    }

    Some(Accepted {
        chat_id: message.chat.id,
        user_id,
        text,
    })
}

/// Compiles the briefing for `now` and posts it to `chat_id`.
pub async fn send_briefing(
    report: &DailyReport,
    chat: &dyn ChatTransport,
    chat_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let briefing = report.compile(now).await;
    chat.send_message(chat_id, &briefing.render()).await?;
    tracing::info!("✅ Daily report sent to chat {}", chat_id);
    Ok(())
}

pub struct BotEngine {
    telegram: Arc<TelegramClient>,
    assistant: Arc<Assistant>,
    allowed_users: Vec<i64>,
    briefing: Option<BriefingJob>,
}

impl BotEngine {
    pub fn new(
        telegram: Arc<TelegramClient>,
        assistant: Arc<Assistant>,
        allowed_users: Vec<i64>,
    ) -> Self {
        Self {
            telegram,
            assistant,
            allowed_users,
            briefing: None,
        }
    }

    pub fn with_briefing(mut self, job: BriefingJob) -> Self {
        self.briefing = Some(job);
        self
    }

    /// Answers each accepted message on its own task. Returns the next offset.
    pub fn dispatch(&self, updates: Vec<Update>, offset: Option<i64>) -> Option<i64> {
        let mut next = offset;
        for update in updates {
            next = Some(next.map_or(update.update_id + 1, |n| n.max(update.update_id + 1)));

            let Some(accepted) = accept(&update, &self.allowed_users) else {
                continue;
            };
            tracing::debug!("💬 chat={} user={:?}", accepted.chat_id, accepted.user_id);

            let chat_id = accepted.chat_id;
            let text = accepted.text.to_string();
            let assistant = Arc::clone(&self.assistant);
            let telegram = Arc::clone(&self.telegram);
            tokio::spawn(async move {
                if let Err(e) = assistant
                    .reply_to(telegram.as_ref(), chat_id, &text, Utc::now())
                    .await
                {
                    tracing::error!("❌ Failed to reply in chat {}: {}", chat_id, e);
                }
            });
        }
        next
    }

    async fn poll(&self) -> Result<()> {
        let mut offset = None;
        loop {
            match self.telegram.get_updates(offset).await {
                Ok(updates) => offset = self.dispatch(updates, offset),
                Err(e) if e.is_retryable() => {
                    tracing::warn!("⚠️ getUpdates failed, retrying in {:?}: {}", POLL_BACKOFF, e);
                    tokio::time::sleep(POLL_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn spawn_briefing(&self) -> Option<tokio::task::JoinHandle<()>> {
        let job = self.briefing.as_ref()?;
        let report = Arc::clone(&job.report);
        let telegram = Arc::clone(&self.telegram);
        let chat_id = job.chat_id;
        let schedule = job.schedule;

        tracing::info!(
            "📅 Daily report scheduled at {} {} -> chat {}",
            schedule.at.format("%H:%M"),
            schedule.timezone,
            chat_id
        );
        Some(tokio::spawn(async move {
            schedule
                .run_forever(|at| {
                    let report = Arc::clone(&report);
                    let telegram = Arc::clone(&telegram);
                    async move {
                        if let Err(e) = send_briefing(&report, telegram.as_ref(), chat_id, at).await {
                            tracing::error!("❌ Daily report could not be sent: {}", e);
                        }
                    }
                })
                .await;
        }))
    }

    /// Polls until Ctrl+C or a non-retryable Telegram error.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            "🤖 Bot is running (intent parser: {}). Press Ctrl+C to stop.",
            self.assistant.parser_name()
        );
        let scheduler = self.spawn_briefing();

        let result = tokio::select! {
            result = self.poll() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("👋 Shutting down");
                Ok(())
            }
        };

        if let Some(handle) = scheduler {
            handle.abort();
        }
        result
    }
}
