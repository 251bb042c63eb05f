use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Token signing failed: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Authentication error: {message}")]
    AuthError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Could not understand message: {message}")]
    IntentError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn upstream(service: &str, status: reqwest::StatusCode, body: String) -> Self {
        BotError::UpstreamError {
            service: service.to_string(),
            status: status.as_u16(),
            body,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::ApiError(_) => ErrorCategory::Network,
            BotError::UpstreamError { .. } | BotError::AuthError { .. } => ErrorCategory::Upstream,
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BotError::SerializationError(_)
            | BotError::IntentError { .. }
            | BotError::ProcessingError { .. } => ErrorCategory::Data,
            BotError::IoError(_) | BotError::JwtError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::IntentError { .. } => ErrorSeverity::Low,
            BotError::ApiError(_) | BotError::UpstreamError { .. } => ErrorSeverity::Medium,
            BotError::SerializationError(_) | BotError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            BotError::AuthError { .. }
            | BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. }
            | BotError::IoError(_)
            | BotError::JwtError(_) => ErrorSeverity::Critical,
        }
    }

    /// 是否值得稍後重試
    pub fn is_retryable(&self) -> bool {
        match self {
            BotError::ApiError(_) => true,
            BotError::UpstreamError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::ApiError(_) => {
                "Check network connectivity and that the service host is reachable".to_string()
            }
            BotError::UpstreamError { service, status, .. } => match status {
                401 | 403 => format!("Check the {} credentials and their permissions", service),
                404 => format!("Check the {} resource identifiers (store, sheet id, tab)", service),
                429 => format!("{} is rate limiting requests; wait and retry", service),
                _ => format!("{} is having trouble; retry later", service),
            },
            BotError::AuthError { .. } | BotError::JwtError(_) => {
                "Check the Google service account JSON and its private key".to_string()
            }
            BotError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or its environment variable", field)
            }
            BotError::InvalidConfigValueError { field, .. }
            | BotError::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}' in the config file", field)
            }
            BotError::ConfigError { .. } => "Review the config file".to_string(),
            BotError::IoError(_) => "Check file paths and permissions".to_string(),
            BotError::SerializationError(_) | BotError::ProcessingError { .. } => {
                "The upstream response had an unexpected shape; run with --verbose".to_string()
            }
            BotError::IntentError { .. } => "Rephrase the question".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach a data source: {}", self),
            ErrorCategory::Upstream => format!("A data source rejected the request: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
