use crate::domain::model::MailSearchResults;
use crate::domain::ports::Mailbox;
use std::sync::Arc;

/// Runs one Gmail query against every configured inbox.
pub struct MailSearch {
    mailbox: Arc<dyn Mailbox>,
    inboxes: Vec<String>,
    max_results: usize,
}

impl MailSearch {
    pub fn new(mailbox: Arc<dyn Mailbox>, inboxes: Vec<String>, max_results: usize) -> Self {
        Self {
            mailbox,
            inboxes,
            max_results,
        }
    }

    /// 單一信箱失敗只記錄，不影響其他信箱
    pub async fn search_all(&self, query: &str) -> MailSearchResults {
        let mut inboxes = Vec::with_capacity(self.inboxes.len());

        for inbox in &self.inboxes {
            let hits = match self.mailbox.search(inbox, query, self.max_results).await {
                Ok(hits) => {
                    tracing::debug!("📬 {} -> {} hits for '{}'", inbox, hits.len(), query);
                    hits
                }
                Err(e) => {
                    tracing::error!("❌ Gmail search failed for {}: {}", inbox, e);
                    Vec::new()
                }
            };
            inboxes.push((inbox.clone(), hits));
        }

        MailSearchResults {
            query: query.to_string(),
            inboxes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::EmailHit;
    use crate::utils::error::{BotError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeMailbox {
        broken_inbox: &'static str,
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl Mailbox for FakeMailbox {
        async fn search(&self, inbox: &str, query: &str, max_results: usize) -> Result<Vec<EmailHit>> {
            self.seen.lock().unwrap().push((inbox.to_string(), max_results));
            if inbox == self.broken_inbox {
                return Err(BotError::AuthError {
                    message: "delegation denied".to_string(),
                });
            }
            Ok(vec![EmailHit {
                subject: format!("Re: {}", query),
                from: "TRS <orders@trs.example>".to_string(),
                date: "17 Oct 2026 09:12".to_string(),
                link: "https://mail.google.com/mail/u/0/#all/abc".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn test_failed_inbox_yields_empty_hits() {
        let mailbox = Arc::new(FakeMailbox {
            broken_inbox: "accounts@spicevillage.eu",
            seen: Mutex::new(Vec::new()),
        });
        let search = MailSearch::new(
            mailbox.clone(),
            vec![
                "info@spicevillage.eu".to_string(),
                "accounts@spicevillage.eu".to_string(),
            ],
            3,
        );

        let results = search.search_all("invoice TRS").await;

        assert_eq!(results.query, "invoice TRS");
        assert_eq!(results.inboxes.len(), 2);
        assert_eq!(results.inboxes[0].1[0].subject, "Re: invoice TRS");
        assert!(results.inboxes[1].1.is_empty());
        assert!(!results.is_empty());
        assert!(mailbox.seen.lock().unwrap().iter().all(|(_, max)| *max == 3));
    }
}
