pub mod auth;
pub mod gmail;
pub mod sheets;

pub use auth::{ServiceAccountKey, ServiceAccountTokens, StaticToken};
pub use gmail::GmailClient;
pub use sheets::SheetsClient;
