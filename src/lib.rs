pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use config::BotConfig;
pub use core::{build_engine, build_services, BotEngine, Services};
pub use utils::error::{BotError, Result};
