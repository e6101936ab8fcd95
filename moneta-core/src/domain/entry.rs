//! Ledger entry domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Kind of balance-changing operation an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdraw,
    TransferIn,
    TransferOut,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Withdraw => "withdraw",
            EntryKind::TransferIn => "transfer_in",
            EntryKind::TransferOut => "transfer_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(EntryKind::Deposit),
            "withdraw" => Some(EntryKind::Withdraw),
            "transfer_in" => Some(EntryKind::TransferIn),
            "transfer_out" => Some(EntryKind::TransferOut),
            _ => None,
        }
    }
}

/// Terminal outcome recorded on an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Success,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Success => "SUCCESS",
            EntryStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESS" => Some(EntryStatus::Success),
            "FAILED" => Some(EntryStatus::Failed),
            _ => None,
        }
    }
}

/// One immutable audit row describing a balance-changing attempt.
///
/// Every attempted mutation that got as far as touching a real wallet
/// leaves at least one entry, FAILED ones included. A successful transfer
/// leaves exactly two (TransferOut on the sender's wallet, TransferIn on
/// the receiver's) sharing sender/receiver ids, amount, and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub status: EntryStatus,
    pub timestamp: DateTime<Utc>,
    /// Acting user on transfer rows
    pub sender_id: Option<Uuid>,
    /// Receiving user on transfer rows
    pub receiver_id: Option<Uuid>,
}

impl LedgerEntry {
    /// Create a non-transfer entry
    pub fn new(wallet_id: Uuid, kind: EntryKind, amount: Decimal, status: EntryStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount,
            status,
            timestamp: Utc::now(),
            sender_id: None,
            receiver_id: None,
        }
    }

    /// Create a transfer entry carrying counterparty identities
    pub fn transfer(
        wallet_id: Uuid,
        kind: EntryKind,
        amount: Decimal,
        status: EntryStatus,
        sender_id: Uuid,
        receiver_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount,
            status,
            timestamp: Utc::now(),
            sender_id: Some(sender_id),
            receiver_id,
        }
    }
}

/// Largest amount a single operation may move. Keeps cent arithmetic far
/// away from i64 range regardless of how many operations accumulate.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 2);

/// Validate an operation amount: strictly positive, at most two
/// fractional digits, within range. Runs before any lock is taken;
/// a rejection here never produces an entry row.
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount);
    }
    if amount.normalize().scale() > 2 {
        return Err(Error::InvalidAmount);
    }
    if amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount);
    }
    Ok(())
}
