//! Cache port - advisory balance and listing cache
//!
//! The cache is never a source of truth. Every operation is infallible
//! from the caller's point of view: adapters swallow their own failures
//! and a miss is always a legal answer, so the ledger stays correct with
//! the cache entirely absent. Entries carry a bounded TTL so staleness
//! after a missed invalidation self-heals.

use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::services::wallet::TransactionView;

/// Advisory key/value cache for balances and transaction listings
pub trait WalletCache: Send + Sync {
    /// Cached balance for a user, if present and not expired
    fn get_balance(&self, user_id: Uuid) -> Option<Decimal>;

    /// Refresh the cached balance
    fn set_balance(&self, user_id: Uuid, balance: Decimal, ttl: Duration);

    /// Evict the cached balance
    fn invalidate_balance(&self, user_id: Uuid);

    /// Cached transaction listing for a user, if present and not expired
    fn get_transactions(&self, user_id: Uuid) -> Option<Vec<TransactionView>>;

    /// Cache a transaction listing
    fn set_transactions(&self, user_id: Uuid, listing: &[TransactionView], ttl: Duration);

    /// Evict the cached listing. Listings are always evicted whole,
    /// never patched.
    fn invalidate_transactions(&self, user_id: Uuid);
}

/// Cache that never hits; used in tests and as the disabled-cache mode
pub struct NoCache;

impl WalletCache for NoCache {
    fn get_balance(&self, _user_id: Uuid) -> Option<Decimal> {
        None
    }

    fn set_balance(&self, _user_id: Uuid, _balance: Decimal, _ttl: Duration) {}

    fn invalidate_balance(&self, _user_id: Uuid) {}

    fn get_transactions(&self, _user_id: Uuid) -> Option<Vec<TransactionView>> {
        None
    }

    fn set_transactions(&self, _user_id: Uuid, _listing: &[TransactionView], _ttl: Duration) {}

    fn invalidate_transactions(&self, _user_id: Uuid) {}
}
