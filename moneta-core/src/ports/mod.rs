//! Port definitions - trait seams for external collaborators
//!
//! The ledger consumes its cache, notifier, and audit log through these
//! narrow interfaces so the engine can be tested in isolation with
//! injected fakes.

pub mod cache;
pub mod notifier;

pub use cache::{NoCache, WalletCache};
pub use notifier::{AuditSink, Notifier, NotifyEvent, NullAuditSink, NullNotifier};
