//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod accounts;
mod ledger;
pub mod limits;
pub mod migration;
pub mod wallet;

pub use accounts::AccountService;
pub use ledger::LedgerService;
pub use limits::DayWindow;
pub use migration::{MigrationResult, MigrationService};
pub use wallet::{TransactionView, WalletService};
