//! Wallet service - provisioning and cached reads
//!
//! Reads consult the advisory cache first and fall back to the store;
//! the store answer refreshes the cache. Correctness never depends on a
//! cache hit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::adapters::{DuckDbStore, EntryWithNames};
use crate::domain::result::{Error, Result};
use crate::domain::{EntryKind, EntryStatus, Wallet};
use crate::ports::WalletCache;

/// One row of a user-facing transaction listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub status: EntryStatus,
    pub timestamp: DateTime<Utc>,
    /// Resolved display name of the other party on transfer rows
    pub counterparty_name: Option<String>,
}

/// Project joined ledger rows into listing views.
///
/// The counterparty is the receiver on outgoing transfers and the sender
/// on incoming ones; other kinds have none.
pub(crate) fn views_from(rows: Vec<EntryWithNames>) -> Vec<TransactionView> {
    rows.into_iter()
        .map(|row| {
            let counterparty_name = match row.entry.kind {
                EntryKind::TransferOut => row.receiver_name,
                EntryKind::TransferIn => row.sender_name,
                EntryKind::Deposit | EntryKind::Withdraw => None,
            };
            TransactionView {
                id: row.entry.id,
                wallet_id: row.entry.wallet_id,
                kind: row.entry.kind,
                amount: row.entry.amount,
                status: row.entry.status,
                timestamp: row.entry.timestamp,
                counterparty_name,
            }
        })
        .collect()
}

/// Wallet provisioning and read surface
pub struct WalletService {
    store: Arc<DuckDbStore>,
    cache: Arc<dyn WalletCache>,
    cache_ttl: Duration,
}

impl WalletService {
    pub fn new(store: Arc<DuckDbStore>, cache: Arc<dyn WalletCache>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Return the user's wallet, creating it with a zero balance if it
    /// does not exist yet.
    ///
    /// Safe under concurrent first access: creation is an
    /// insert-if-absent, so the second caller observes the first
    /// caller's row instead of violating the one-wallet-per-user
    /// invariant.
    pub fn get_or_create_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        if let Some(mut wallet) = self.store.get_wallet_by_user(user_id)? {
            if let Some(cached) = self.cache.get_balance(user_id) {
                wallet.balance = cached;
            } else {
                self.cache
                    .set_balance(user_id, wallet.balance, self.cache_ttl);
            }
            return Ok(wallet);
        }

        self.store
            .create_wallet_if_absent(&Wallet::new(Uuid::new_v4(), user_id))?;
        let wallet = self
            .store
            .get_wallet_by_user(user_id)?
            .ok_or(Error::WalletNotFound)?;
        self.cache
            .set_balance(user_id, wallet.balance, self.cache_ttl);
        Ok(wallet)
    }

    /// Current balance, cache first
    pub fn get_balance(&self, user_id: Uuid) -> Result<Decimal> {
        if let Some(cached) = self.cache.get_balance(user_id) {
            return Ok(cached);
        }
        let wallet = self
            .store
            .get_wallet_by_user(user_id)?
            .ok_or(Error::WalletNotFound)?;
        self.cache
            .set_balance(user_id, wallet.balance, self.cache_ttl);
        Ok(wallet.balance)
    }

    /// Full transaction listing for the user's wallet, newest first,
    /// cache first
    pub fn list_transactions(&self, user_id: Uuid) -> Result<Vec<TransactionView>> {
        if let Some(cached) = self.cache.get_transactions(user_id) {
            return Ok(cached);
        }

        let wallet = self
            .store
            .get_wallet_by_user(user_id)?
            .ok_or(Error::WalletNotFound)?;
        let views = views_from(self.store.list_entries_with_names(wallet.id)?);
        self.cache
            .set_transactions(user_id, &views, self.cache_ttl);
        Ok(views)
    }
}
