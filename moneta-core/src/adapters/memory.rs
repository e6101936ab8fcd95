//! In-process TTL cache adapter
//!
//! Values are stored as serialized JSON with an expiry deadline, the same
//! shape an external key/value cache would hold. Expiry is enforced on
//! read; a poisoned lock or a decode failure is treated as a miss.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ports::WalletCache;
use crate::services::wallet::TransactionView;

struct CacheEntry {
    json: String,
    expires: Instant,
}

/// Advisory in-process cache with per-entry TTL
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

fn balance_key(user_id: Uuid) -> String {
    format!("wallet_balance:{}", user_id)
}

fn transactions_key(user_id: Uuid) -> String {
    format!("wallet_transactions:{}", user_id)
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get_json(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.expires > Instant::now() => Some(entry.json.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_json(&self, key: String, json: String, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    json,
                    expires: Instant::now() + ttl,
                },
            );
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletCache for MemoryCache {
    fn get_balance(&self, user_id: Uuid) -> Option<Decimal> {
        let json = self.get_json(&balance_key(user_id))?;
        serde_json::from_str(&json).ok()
    }

    fn set_balance(&self, user_id: Uuid, balance: Decimal, ttl: Duration) {
        if let Ok(json) = serde_json::to_string(&balance) {
            self.set_json(balance_key(user_id), json, ttl);
        }
    }

    fn invalidate_balance(&self, user_id: Uuid) {
        self.delete(&balance_key(user_id));
    }

    fn get_transactions(&self, user_id: Uuid) -> Option<Vec<TransactionView>> {
        let json = self.get_json(&transactions_key(user_id))?;
        serde_json::from_str(&json).ok()
    }

    fn set_transactions(&self, user_id: Uuid, listing: &[TransactionView], ttl: Duration) {
        if let Ok(json) = serde_json::to_string(listing) {
            self.set_json(transactions_key(user_id), json, ttl);
        }
    }

    fn invalidate_transactions(&self, user_id: Uuid) {
        self.delete(&transactions_key(user_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_round_trip() {
        let cache = MemoryCache::new();
        let user = Uuid::new_v4();
        let balance = Decimal::new(12345, 2);

        assert_eq!(cache.get_balance(user), None);
        cache.set_balance(user, balance, Duration::from_secs(60));
        assert_eq!(cache.get_balance(user), Some(balance));

        cache.invalidate_balance(user);
        assert_eq!(cache.get_balance(user), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        let user = Uuid::new_v4();

        cache.set_balance(user, Decimal::ONE, Duration::from_secs(0));
        assert_eq!(cache.get_balance(user), None);
    }

    #[test]
    fn test_listing_evicted_whole() {
        let cache = MemoryCache::new();
        let user = Uuid::new_v4();

        cache.set_transactions(user, &[], Duration::from_secs(60));
        assert_eq!(cache.get_transactions(user), Some(vec![]));

        cache.invalidate_transactions(user);
        assert_eq!(cache.get_transactions(user), None);
    }
}
