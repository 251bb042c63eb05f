use crate::domain::model::CompanyProfile;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveTime;
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    pub shopify: ShopifyConfig,
    pub flour_cloud: FlourCloudConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub restaurant: Option<RestaurantConfig>,
    #[serde(default)]
    pub suppliers: Option<SupplierConfig>,
    #[serde(default)]
    pub gmail: Option<GmailConfig>,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub company: CompanyProfile,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
    pub report_chat_id: Option<i64>,
    pub api_base_url: Option<String>,
    pub poll_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShopifyConfig {
    pub store: String,
    pub access_token: String,
    pub api_version: Option<String>,
    pub page_size: Option<usize>,
    /// 測試用：覆寫 `https://{store}`
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FlourCloudConfig {
    pub token: String,
    pub base_url: Option<String>,
    pub page_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleConfig {
    pub service_account_file: Option<String>,
    pub sheets_base_url: Option<String>,
    pub gmail_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantConfig {
    pub sheet_id: String,
    pub header_range: Option<String>,
    pub data_range: Option<String>,
    pub totals_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub sheet_id: String,
    /// Known supplier names, quoted to the intent parser.
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    pub inboxes: Vec<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleConfig {
    pub enabled: Option<bool>,
    pub timezone: Option<String>,
    pub daily_report_at: Option<String>,
    pub retries: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-10";
const DEFAULT_FLOUR_BASE_URL: &str = "https://flour.host";
const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_LLM_MODEL: &str = "claude-haiku-4-5-20251001";

impl BotConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: BotConfig =
            toml::from_str(&processed_content).map_err(|e| BotError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${SHOPIFY_ACCESS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::ConfigError {
            message: format!("env placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Comma lists and ids that do not fit a TOML string placeholder.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("ALLOWED_USER_IDS") {
            self.telegram.allowed_user_ids = parse_id_list("ALLOWED_USER_IDS", &raw)?;
        }
        if let Ok(raw) = std::env::var("DAILY_REPORT_CHAT_ID") {
            let raw = raw.trim();
            if !raw.is_empty() {
                let id = raw
                    .parse::<i64>()
                    .map_err(|e| BotError::InvalidConfigValueError {
                        field: "DAILY_REPORT_CHAT_ID".to_string(),
                        value: raw.to_string(),
                        reason: e.to_string(),
                    })?;
                self.telegram.report_chat_id = Some(id);
            }
        }
        Ok(())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("shopify.store", &self.shopify.store)?;
        validation::validate_non_empty_string("shopify.access_token", &self.shopify.access_token)?;
        validation::validate_url("shopify.base_url", &self.shopify_base_url())?;
        validation::validate_positive_number("shopify.page_size", self.shopify_page_size(), 1)?;

        validation::validate_non_empty_string("flour_cloud.token", &self.flour_cloud.token)?;
        validation::validate_url("flour_cloud.base_url", self.flour_base_url())?;
        validation::validate_positive_number(
            "flour_cloud.page_size",
            self.flour_page_size(),
            1,
        )?;

        validation::validate_url("google.sheets_base_url", self.sheets_base_url())?;
        validation::validate_url("google.gmail_base_url", self.gmail_base_url())?;
        validation::validate_url("telegram.api_base_url", self.telegram_base_url())?;

        if let Some(llm) = &self.llm {
            validation::validate_non_empty_string("llm.api_key", &llm.api_key)?;
            validation::validate_url("llm.base_url", self.llm_base_url())?;
        }
        if let Some(gmail) = &self.gmail {
            validation::validate_range("gmail.max_results", self.gmail_max_results(), 1, 50)?;
            for inbox in &gmail.inboxes {
                validation::validate_non_empty_string("gmail.inboxes", inbox)?;
            }
        }

        self.timezone()?;
        self.daily_report_at()?;
        validation::validate_range("schedule.retries", self.report_retries(), 1, 10)?;
        Ok(())
    }

    pub fn shopify_base_url(&self) -> String {
        self.shopify
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.shopify.store))
    }

    pub fn shopify_api_version(&self) -> &str {
        self.shopify
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_SHOPIFY_API_VERSION)
    }

    pub fn shopify_page_size(&self) -> usize {
        self.shopify.page_size.unwrap_or(250)
    }

    pub fn flour_base_url(&self) -> &str {
        self.flour_cloud
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_FLOUR_BASE_URL)
    }

    pub fn flour_page_size(&self) -> usize {
        self.flour_cloud.page_size.unwrap_or(1000)
    }

    pub fn request_timeout_seconds(&self) -> u64 {
        self.shopify
            .timeout_seconds
            .or(self.flour_cloud.timeout_seconds)
            .unwrap_or(30)
    }

    pub fn telegram_base_url(&self) -> &str {
        self.telegram
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_TELEGRAM_BASE_URL)
    }

    pub fn poll_timeout_seconds(&self) -> u64 {
        self.telegram.poll_timeout_seconds.unwrap_or(30)
    }

    pub fn sheets_base_url(&self) -> &str {
        self.google
            .sheets_base_url
            .as_deref()
            .unwrap_or(DEFAULT_SHEETS_BASE_URL)
    }

    pub fn gmail_base_url(&self) -> &str {
        self.google
            .gmail_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GMAIL_BASE_URL)
    }

    pub fn gmail_max_results(&self) -> usize {
        self.gmail
            .as_ref()
            .and_then(|g| g.max_results)
            .unwrap_or(3)
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm
            .as_ref()
            .and_then(|l| l.base_url.as_deref())
            .unwrap_or(DEFAULT_ANTHROPIC_BASE_URL)
    }

    pub fn llm_model(&self) -> &str {
        self.llm
            .as_ref()
            .and_then(|l| l.model.as_deref())
            .unwrap_or(DEFAULT_LLM_MODEL)
    }

    pub fn llm_max_tokens(&self) -> usize {
        self.llm.as_ref().and_then(|l| l.max_tokens).unwrap_or(200)
    }

    pub fn timezone(&self) -> Result<Tz> {
        validation::validate_timezone(
            "schedule.timezone",
            self.schedule.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE),
        )
    }

    pub fn daily_report_at(&self) -> Result<NaiveTime> {
        validation::validate_time_of_day(
            "schedule.daily_report_at",
            self.schedule.daily_report_at.as_deref().unwrap_or("04:00"),
        )
    }

    /// 沒有設定報告聊天室就不排程
    pub fn daily_report_enabled(&self) -> bool {
        self.schedule.enabled.unwrap_or(true) && self.telegram.report_chat_id.is_some()
    }

    pub fn report_retries(&self) -> u32 {
        self.schedule.retries.unwrap_or(3)
    }

    pub fn report_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.schedule.retry_delay_seconds.unwrap_or(300))
    }

    /// Names for the intent prompt; empty when no supplier sheet is set up.
    pub fn supplier_names(&self) -> &[String] {
        self.suppliers
            .as_ref()
            .map(|s| s.names.as_slice())
            .unwrap_or(&[])
    }

    pub fn gmail_inboxes(&self) -> &[String] {
        self.gmail
            .as_ref()
            .map(|g| g.inboxes.as_slice())
            .unwrap_or(&[])
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

fn parse_id_list(field: &str, raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| BotError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: s.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
