//! Builds the object graph from a validated [`BotConfig`].

use crate::adapters::google::{GmailClient, ServiceAccountKey, ServiceAccountTokens, SheetsClient, StaticToken};
use crate::adapters::http::build_client;
use crate::adapters::{ClaudeIntentParser, FlourCloudFetcher, ShopifyFetcher, TelegramClient};
use crate::app::{
    build_system_prompt, Aggregator, Assistant, DailyReport, KeywordIntentParser, MailSearch,
    RestaurantLedger, SupplierLedger,
};
use crate::config::BotConfig;
use crate::core::engine::{BotEngine, BriefingJob};
use crate::core::scheduler::DailySchedule;
use crate::domain::ports::{AccessTokenProvider, IntentParser, SheetSource};
use crate::utils::error::Result;
use crate::utils::validation;
use reqwest::Client;
use std::sync::Arc;

/// Everything the subcommands need, wired once.
pub struct Services {
    pub aggregator: Arc<Aggregator>,
    pub restaurant: Option<Arc<RestaurantLedger>>,
    pub sheets: Option<Arc<dyn SheetSource>>,
    pub assistant: Arc<Assistant>,
    pub report: Arc<DailyReport>,
}

/// GOOGLE_ACCESS_TOKEN 優先，其次是服務帳號金鑰
fn google_tokens(config: &BotConfig, client: &Client) -> Result<Arc<dyn AccessTokenProvider>> {
    if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
        if !token.trim().is_empty() {
            tracing::info!("🔑 Using GOOGLE_ACCESS_TOKEN for Google APIs");
            return Ok(Arc::new(StaticToken(token.trim().to_string())));
        }
    }
    let key = ServiceAccountKey::load(config.google.service_account_file.as_deref())?;
    tracing::info!("🔑 Google service account: {}", key.client_email);
    Ok(Arc::new(ServiceAccountTokens::new(client.clone(), key)))
}

fn intent_parser(config: &BotConfig, client: &Client) -> Result<Arc<dyn IntentParser>> {
    match &config.llm {
        Some(llm) => {
            let prompt = build_system_prompt(
                &config.company,
                config.supplier_names(),
                config.gmail_inboxes(),
            );
            Ok(Arc::new(ClaudeIntentParser::new(
                client.clone(),
                config.llm_base_url(),
                llm.api_key.clone(),
                config.llm_model(),
                config.llm_max_tokens(),
                prompt,
            )))
        }
        None => {
            tracing::warn!("⚠️ No [llm] section; falling back to keyword intent parsing");
            Ok(Arc::new(KeywordIntentParser::new(
                config.supplier_names().to_vec(),
            )?))
        }
    }
}

pub fn build_services(config: &BotConfig) -> Result<Services> {
    let client = build_client(config.request_timeout_seconds())?;
    let timezone = config.timezone()?;

    let online = Arc::new(ShopifyFetcher::new(
        client.clone(),
        config.shopify_base_url(),
        config.shopify_api_version(),
        config.shopify.access_token.clone(),
        config.shopify_page_size(),
    ));
    let retail = Arc::new(FlourCloudFetcher::new(
        client.clone(),
        config.flour_base_url(),
        config.flour_cloud.token.clone(),
        config.flour_page_size(),
        timezone,
    ));
    let aggregator = Arc::new(Aggregator::new(online, retail));

    let needs_google =
        config.restaurant.is_some() || config.suppliers.is_some() || config.gmail.is_some();
    let tokens = if needs_google {
        Some(google_tokens(config, &client)?)
    } else {
        None
    };
    let sheets: Option<Arc<dyn SheetSource>> = tokens.as_ref().map(|tokens| {
        Arc::new(SheetsClient::new(
            client.clone(),
            config.sheets_base_url(),
            Arc::clone(tokens),
        )) as Arc<dyn SheetSource>
    });

    let restaurant = match (&config.restaurant, &sheets) {
        (Some(section), Some(sheets)) => Some(Arc::new(
            RestaurantLedger::new(Arc::clone(sheets), section.sheet_id.clone(), timezone)
                .with_ranges(
                    section.header_range.as_deref(),
                    section.data_range.as_deref(),
                    section.totals_label.as_deref(),
                ),
        )),
        _ => None,
    };

    let mut assistant = Assistant::new(
        intent_parser(config, &client)?,
        Arc::clone(&aggregator),
        config.company.clone(),
    );
    if let (Some(section), Some(sheets)) = (&config.suppliers, &sheets) {
        assistant = assistant.with_suppliers(SupplierLedger::new(
            Arc::clone(sheets),
            section.sheet_id.clone(),
        ));
    }
    if let (Some(section), Some(tokens)) = (&config.gmail, &tokens) {
        let gmail = GmailClient::new(client.clone(), config.gmail_base_url(), Arc::clone(tokens));
        assistant = assistant.with_mail(MailSearch::new(
            Arc::new(gmail),
            section.inboxes.clone(),
            config.gmail_max_results(),
        ));
    }

    let report = Arc::new(DailyReport::new(
        Arc::clone(&aggregator),
        restaurant.clone(),
        timezone,
        config.report_retries(),
        config.report_retry_delay(),
    ));

    Ok(Services {
        aggregator,
        restaurant,
        sheets,
        assistant: Arc::new(assistant),
        report,
    })
}

pub fn build_telegram(config: &BotConfig) -> Result<TelegramClient> {
    let token = validation::validate_required_field("telegram.token", &config.telegram.token)?;
    validation::validate_non_empty_string("telegram.token", token)?;
    Ok(TelegramClient::new(
        build_client(config.request_timeout_seconds())?,
        config.telegram_base_url(),
        token,
        config.poll_timeout_seconds(),
    ))
}

pub fn build_engine(config: &BotConfig, services: &Services) -> Result<BotEngine> {
    let telegram = Arc::new(build_telegram(config)?);
    let mut engine = BotEngine::new(
        telegram,
        Arc::clone(&services.assistant),
        config.telegram.allowed_user_ids.clone(),
    );

    match (config.daily_report_enabled(), config.telegram.report_chat_id) {
        (true, Some(chat_id)) => {
            engine = engine.with_briefing(BriefingJob {
                report: Arc::clone(&services.report),
                chat_id,
                schedule: DailySchedule::new(config.daily_report_at()?, config.timezone()?),
            });
        }
        (_, None) => tracing::warn!("⚠️ No telegram.report_chat_id; daily briefing disabled"),
        (false, Some(_)) => tracing::info!("Daily briefing switched off in [schedule]"),
    }
    Ok(engine)
}
