// Application layer: answers built on top of the domain ports.

pub mod aggregator;
pub mod assistant;
pub mod format;
pub mod intent;
pub mod mail;
pub mod report;
pub mod restaurant;
pub mod supplier;

pub use aggregator::{Aggregator, SalesAnswer};
pub use assistant::Assistant;
pub use intent::{build_system_prompt, KeywordIntentParser};
pub use mail::MailSearch;
pub use report::{DailyBriefing, DailyReport};
pub use restaurant::RestaurantLedger;
pub use supplier::SupplierLedger;
