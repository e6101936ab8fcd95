//! Adapter implementations for the store, cache, notifier, and audit
//! sink ports

pub mod audit;
pub mod duckdb;
pub mod memory;
pub mod webhook;

pub use audit::FileAuditSink;
pub use duckdb::{DuckDbStore, EntryWithNames, StoreTx};
pub use memory::MemoryCache;
pub use webhook::WebhookNotifier;
