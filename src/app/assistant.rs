//! One chat turn: parse the message, answer it, send the replies.

use crate::app::aggregator::Aggregator;
use crate::app::format::{
    format_company_profile, format_mail_results, format_sales_answer, format_supplier_lookup,
    CHECKING_TEXT, HELP_TEXT, NOT_UNDERSTOOD_PREFIX,
};
use crate::app::mail::MailSearch;
use crate::app::supplier::SupplierLedger;
use crate::domain::intent::Intent;
use crate::domain::model::CompanyProfile;
use crate::domain::ports::{ChatTransport, IntentParser};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const ASK_SUPPLIER_TEXT: &str = "Which supplier? e.g. \"What do we owe Transfood?\"";
pub const ASK_SEARCH_TEXT: &str =
    "What should I search for? Try: \"find invoice from TRS\" or \"email about delivery\".";
pub const SUPPLIERS_OFF_TEXT: &str = "Supplier ledger is not configured.";
pub const MAIL_OFF_TEXT: &str = "Gmail search is not configured.";

pub struct Assistant {
    parser: Arc<dyn IntentParser>,
    aggregator: Arc<Aggregator>,
    suppliers: Option<SupplierLedger>,
    mail: Option<MailSearch>,
    company: CompanyProfile,
}

impl Assistant {
    pub fn new(
        parser: Arc<dyn IntentParser>,
        aggregator: Arc<Aggregator>,
        company: CompanyProfile,
    ) -> Self {
        Self {
            parser,
            aggregator,
            suppliers: None,
            mail: None,
            company,
        }
    }

    pub fn with_suppliers(mut self, ledger: SupplierLedger) -> Self {
        self.suppliers = Some(ledger);
        self
    }

    pub fn with_mail(mut self, mail: MailSearch) -> Self {
        self.mail = Some(mail);
        self
    }

    pub fn parser_name(&self) -> &'static str {
        self.parser.name()
    }

    pub async fn interpret(&self, message: &str) -> Result<Intent> {
        let parsed = self.parser.parse(message).await?;
        tracing::info!(
            "🧭 intent={} period={:?} channel={:?} product={:?} search_query={:?}",
            parsed.intent.as_deref().unwrap_or("unknown"),
            parsed.period,
            parsed.channel,
            parsed.product,
            parsed.search_query
        );
        Ok(parsed.resolve())
    }

    async fn answer(&self, intent: &Intent, now: DateTime<Utc>) -> Result<String> {
        match intent {
            Intent::SalesByPeriod(query) | Intent::SalesByProduct(query) => {
                let answer = self.aggregator.answer(query, now).await?;
                Ok(format_sales_answer(&answer))
            }
            Intent::CompanyInfo { .. } => Ok(format_company_profile(&self.company)),
            Intent::SupplierOutstanding { supplier: None } => Ok(ASK_SUPPLIER_TEXT.to_string()),
            Intent::SupplierOutstanding {
                supplier: Some(supplier),
            } => match &self.suppliers {
                Some(ledger) => Ok(format_supplier_lookup(&ledger.outstanding(supplier).await?)),
                None => Ok(SUPPLIERS_OFF_TEXT.to_string()),
            },
            Intent::MailSearch { query: None } => Ok(ASK_SEARCH_TEXT.to_string()),
            Intent::MailSearch { query: Some(query) } => match &self.mail {
                Some(mail) => Ok(format_mail_results(&mail.search_all(query).await)),
                None => Ok(MAIL_OFF_TEXT.to_string()),
            },
            Intent::Unknown => Ok(HELP_TEXT.to_string()),
        }
    }

    /// Reply text for a resolved intent. Fetch failures become a chat message.
    pub async fn execute(&self, intent: &Intent, now: DateTime<Utc>) -> String {
        match self.answer(intent, now).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("❌ Data fetch error ({}): {}", intent.kind(), e);
                format!("Couldn't fetch data: {}", e)
            }
        }
    }

    /// Full turn for one incoming message, replies sent through `chat`.
    pub async fn reply_to(
        &self,
        chat: &dyn ChatTransport,
        chat_id: i64,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let intent = match self.interpret(message).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::error!("❌ Intent parse error: {}", e);
                let reply = format!("{}\n\n{}", NOT_UNDERSTOOD_PREFIX, HELP_TEXT);
                return chat.send_message(chat_id, &reply).await;
            }
        };

        if intent == Intent::Unknown {
            return chat.send_message(chat_id, HELP_TEXT).await;
        }

        chat.send_message(chat_id, CHECKING_TEXT).await?;
        let reply = self.execute(&intent, now).await;
        chat.send_message(chat_id, &reply).await
    }
}
