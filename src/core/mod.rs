pub mod bootstrap;
pub mod engine;
pub mod scheduler;

pub use bootstrap::{build_engine, build_services, Services};
pub use engine::BotEngine;
pub use scheduler::DailySchedule;
