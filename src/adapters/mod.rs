// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod anthropic;
pub mod google;
pub mod http;
pub mod telegram;

pub use anthropic::ClaudeIntentParser;
pub use http::{FlourCloudFetcher, ShopifyFetcher};
pub use telegram::TelegramClient;
