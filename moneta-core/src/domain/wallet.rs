//! Wallet domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's single monetary balance record.
///
/// Exactly one wallet exists per user. The balance has two fractional
/// digits and is only ever mutated inside a committed ledger operation;
/// it never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Create a new wallet with a zero balance
    pub fn new(id: Uuid, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            balance: Decimal::new(0, 2),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wallet_starts_at_zero() {
        let wallet = Wallet::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.balance.scale(), 2);
    }
}
