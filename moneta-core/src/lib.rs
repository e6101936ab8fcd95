//! Moneta Core - wallet ledger transaction engine
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Wallet, LedgerEntry)
//! - **ports**: Trait definitions for external collaborators (cache, notifier, audit sink)
//! - **services**: Business logic orchestration, including the ledger engine
//! - **adapters**: Concrete implementations (DuckDB store, in-process cache, webhook, file log)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::{DuckDbStore, FileAuditSink, MemoryCache, WebhookNotifier};
use config::Config;
use ports::{AuditSink, Notifier, NullNotifier, WalletCache};
use services::{AccountService, LedgerService, WalletService};

// Re-export commonly used types at crate root
pub use config::Config as MonetaConfig;
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{EntryKind, EntryStatus, LedgerEntry, User, Wallet};
pub use services::TransactionView;

/// Database filename inside the data directory
pub const DB_FILENAME: &str = "moneta.duckdb";

/// Audit log filename inside the data directory
pub const AUDIT_LOG_FILENAME: &str = "transaction.log";

/// Main context for Moneta operations
///
/// This is the primary entry point for all business logic. It holds the
/// store, configuration, and all services.
pub struct MonetaContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub ledger_service: LedgerService,
    pub wallet_service: WalletService,
    pub account_service: AccountService,
}

impl MonetaContext {
    /// Create a new Moneta context with the default collaborators:
    /// in-process cache, file audit log, and a webhook notifier when an
    /// endpoint is configured.
    pub fn new(moneta_dir: &Path) -> Result<Self> {
        let config = Config::load(moneta_dir)?;

        let cache: Arc<dyn WalletCache> = Arc::new(MemoryCache::new());
        let notifier: Arc<dyn Notifier> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(NullNotifier),
        };
        let audit: Arc<dyn AuditSink> =
            Arc::new(FileAuditSink::new(moneta_dir.join(AUDIT_LOG_FILENAME)));

        Self::with_collaborators(moneta_dir, config, cache, notifier, audit)
    }

    /// Create a context with injected collaborators.
    ///
    /// Tests use this to run the engine against fakes for the cache,
    /// notifier, and audit sink.
    pub fn with_collaborators(
        moneta_dir: &Path,
        config: Config,
        cache: Arc<dyn WalletCache>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        let db_path = moneta_dir.join(DB_FILENAME);
        let store = Arc::new(DuckDbStore::new(&db_path)?);

        // Initialize schema
        store.ensure_schema()?;

        let ledger_service = LedgerService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&notifier),
            Arc::clone(&audit),
            config.daily_limit,
            config.cache_ttl(),
        );
        let wallet_service =
            WalletService::new(Arc::clone(&store), Arc::clone(&cache), config.cache_ttl());
        let account_service =
            AccountService::new(Arc::clone(&store), Arc::clone(&notifier), Arc::clone(&audit));

        Ok(Self {
            config,
            store,
            ledger_service,
            wallet_service,
            account_service,
        })
    }
}
