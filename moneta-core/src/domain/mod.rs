//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod entry;
mod user;
mod wallet;
pub mod result;

pub use entry::{validate_amount, EntryKind, EntryStatus, LedgerEntry, MAX_AMOUNT};
pub use user::User;
pub use wallet::Wallet;
