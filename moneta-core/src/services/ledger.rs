//! Ledger engine - the only code path that moves money
//!
//! Every operation follows the same shape: validate the amount, acquire
//! the per-user wallet locks in ascending owner order, validate account
//! state and business invariants against the locked rows, apply the
//! balance delta together with its audit entry in one commit unit, then
//! reconcile the cache and dispatch notifications after the commit is
//! durable. A failure after the source wallet has been resolved leaves a
//! FAILED audit entry, written in its own commit scope after the primary
//! unit rolled back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::adapters::DuckDbStore;
use crate::domain::result::{Error, Result};
use crate::domain::{validate_amount, EntryKind, EntryStatus, LedgerEntry, User};
use crate::ports::{AuditSink, Notifier, NotifyEvent, WalletCache};
use crate::services::limits::{check_daily_ceiling, DayWindow};

/// One advisory mutex per wallet owner.
///
/// Guards carry no data, so a panic while holding one cannot corrupt
/// anything; poisoned locks are recovered rather than propagated.
struct WalletLocks {
    table: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        let mut table = self
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(table.entry(user_id).or_default())
    }
}

fn lock(handle: &Mutex<()>) -> std::sync::MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The wallet ledger transaction engine
pub struct LedgerService {
    store: Arc<DuckDbStore>,
    cache: Arc<dyn WalletCache>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
    locks: WalletLocks,
    daily_ceiling: Decimal,
    cache_ttl: Duration,
}

impl LedgerService {
    pub fn new(
        store: Arc<DuckDbStore>,
        cache: Arc<dyn WalletCache>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
        daily_ceiling: Decimal,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
            audit,
            locks: WalletLocks::new(),
            daily_ceiling,
            cache_ttl,
        }
    }

    /// Debit the acting user's own wallet.
    ///
    /// Returns the post-operation balance.
    pub fn withdraw(&self, user_id: Uuid, amount: Decimal) -> Result<Decimal> {
        validate_amount(amount)?;

        let handle = self.locks.handle(user_id);
        let guard = lock(&handle);

        let mut touched: Option<Uuid> = None;
        let result = self.store.with_commit(|tx| {
            let wallet = tx
                .get_wallet_by_user(user_id)?
                .ok_or(Error::WalletNotFound)?;
            touched = Some(wallet.id);

            let user = tx.get_user_by_id(user_id)?.ok_or(Error::WalletNotFound)?;
            if user.is_frozen {
                return Err(Error::AccountFrozen);
            }

            let window = DayWindow::current();
            let daily = tx.sum_success_amount(wallet.id, EntryKind::Withdraw, &window)?;
            check_daily_ceiling(EntryKind::Withdraw, daily, amount, self.daily_ceiling)?;

            if wallet.balance < amount {
                return Err(Error::InsufficientFunds);
            }

            let new_balance = wallet.balance - amount;
            tx.update_wallet_balance(wallet.id, new_balance)?;
            tx.insert_entry(&LedgerEntry::new(
                wallet.id,
                EntryKind::Withdraw,
                amount,
                EntryStatus::Success,
            ))?;
            Ok(new_balance)
        });
        drop(guard);

        match result {
            Ok(new_balance) => {
                self.cache.set_balance(user_id, new_balance, self.cache_ttl);
                self.cache.invalidate_transactions(user_id);
                self.audit.record(&format!(
                    "Withdraw SUCCESS user_id={} amount={}",
                    user_id, amount
                ));
                Ok(new_balance)
            }
            Err(e) => {
                if let Some(wallet_id) = touched {
                    self.record_failed(
                        LedgerEntry::new(wallet_id, EntryKind::Withdraw, amount, EntryStatus::Failed),
                        &[user_id],
                    );
                }
                self.audit.record(&format!(
                    "Withdraw FAILED user_id={} amount={}",
                    user_id, amount
                ));
                Err(e)
            }
        }
    }

    /// Move money from the sender's wallet to the recipient's, atomically.
    ///
    /// The recipient is addressed by email. Returns the sender's
    /// post-operation balance.
    pub fn transfer(
        &self,
        sender_id: Uuid,
        recipient_email: &str,
        amount: Decimal,
    ) -> Result<Decimal> {
        validate_amount(amount)?;

        // Cheap short-circuits before any lock: these can only reject,
        // and no wallet has been touched so no FAILED entry is owed.
        // The recipient lookup also determines the lock order below.
        let receiver = self
            .store
            .get_user_by_email(recipient_email)?
            .filter(|u| u.is_active)
            .ok_or(Error::RecipientNotFound)?;
        if receiver.id == sender_id {
            return Err(Error::SelfTransfer);
        }

        // Ascending owner order, regardless of who initiated the call.
        // Two opposed transfers between the same pair take these locks in
        // the same relative order and cannot deadlock.
        let (low, high) = if sender_id < receiver.id {
            (sender_id, receiver.id)
        } else {
            (receiver.id, sender_id)
        };
        let low_handle = self.locks.handle(low);
        let high_handle = self.locks.handle(high);
        let low_guard = lock(&low_handle);
        let high_guard = lock(&high_handle);

        let mut touched: Option<Uuid> = None;
        let result = self.store.with_commit(|tx| {
            // Re-read both parties under the locks so the frozen/active
            // flags are observed alongside the balances they gate.
            let sender = tx
                .get_user_by_id(sender_id)?
                .ok_or(Error::WalletNotFound)?;
            let receiver = tx
                .get_user_by_id(receiver.id)?
                .filter(|u| u.is_active)
                .ok_or(Error::RecipientNotFound)?;

            let sender_wallet = tx
                .get_wallet_by_user(sender.id)?
                .ok_or(Error::WalletNotFound)?;
            touched = Some(sender_wallet.id);

            if sender.is_frozen || receiver.is_frozen {
                return Err(Error::AccountFrozen);
            }

            let receiver_wallet = tx
                .get_wallet_by_user(receiver.id)?
                .ok_or(Error::RecipientNotFound)?;

            let window = DayWindow::current();
            let daily = tx.sum_success_amount(sender_wallet.id, EntryKind::TransferOut, &window)?;
            check_daily_ceiling(EntryKind::TransferOut, daily, amount, self.daily_ceiling)?;

            if sender_wallet.balance < amount {
                return Err(Error::InsufficientFunds);
            }

            // All four effects land together or not at all
            let sender_balance = sender_wallet.balance - amount;
            let receiver_balance = receiver_wallet.balance + amount;
            tx.update_wallet_balance(sender_wallet.id, sender_balance)?;
            tx.update_wallet_balance(receiver_wallet.id, receiver_balance)?;

            let out = LedgerEntry::transfer(
                sender_wallet.id,
                EntryKind::TransferOut,
                amount,
                EntryStatus::Success,
                sender.id,
                Some(receiver.id),
            );
            let mut incoming = LedgerEntry::transfer(
                receiver_wallet.id,
                EntryKind::TransferIn,
                amount,
                EntryStatus::Success,
                sender.id,
                Some(receiver.id),
            );
            // One logical timestamp across both rows
            incoming.timestamp = out.timestamp;
            tx.insert_entry(&out)?;
            tx.insert_entry(&incoming)?;

            Ok((sender_balance, receiver_balance))
        });
        drop(high_guard);
        drop(low_guard);

        match result {
            Ok((sender_balance, receiver_balance)) => {
                self.cache
                    .set_balance(sender_id, sender_balance, self.cache_ttl);
                self.cache
                    .set_balance(receiver.id, receiver_balance, self.cache_ttl);
                self.cache.invalidate_transactions(sender_id);
                self.cache.invalidate_transactions(receiver.id);
                self.notifier.notify(NotifyEvent::TransferReceived {
                    email: receiver.email.clone(),
                    amount,
                });
                self.audit.record(&format!(
                    "Transfer SUCCESS user_id={} receiver_id={} amount={}",
                    sender_id, receiver.id, amount
                ));
                Ok(sender_balance)
            }
            Err(e) => {
                if let Some(wallet_id) = touched {
                    self.record_failed(
                        LedgerEntry::transfer(
                            wallet_id,
                            EntryKind::TransferOut,
                            amount,
                            EntryStatus::Failed,
                            sender_id,
                            Some(receiver.id),
                        ),
                        &[sender_id],
                    );
                }
                self.audit.record(&format!(
                    "Transfer FAILED user_id={} amount={}",
                    sender_id, amount
                ));
                Err(e)
            }
        }
    }

    /// Credit a user's wallet; the admin-only path.
    ///
    /// The target is addressed by email. Returns the target wallet's
    /// post-operation balance.
    pub fn deposit(
        &self,
        admin_id: Uuid,
        target_email: &str,
        amount: Decimal,
    ) -> Result<Decimal> {
        validate_amount(amount)?;

        let admin = self
            .store
            .get_user_by_id(admin_id)?
            .ok_or_else(|| Error::not_found(format!("user {}", admin_id)))?;
        require_admin(&admin)?;
        if admin.is_frozen {
            return Err(Error::AccountFrozen);
        }

        let target = self
            .store
            .get_user_by_email(target_email)?
            .filter(|u| u.is_active)
            .ok_or(Error::RecipientNotFound)?;
        if target.is_frozen {
            return Err(Error::AccountFrozen);
        }

        let handle = self.locks.handle(target.id);
        let guard = lock(&handle);

        let mut touched: Option<Uuid> = None;
        let result = self.store.with_commit(|tx| {
            let wallet = tx
                .get_wallet_by_user(target.id)?
                .ok_or(Error::WalletNotFound)?;
            touched = Some(wallet.id);

            let new_balance = wallet.balance + amount;
            tx.update_wallet_balance(wallet.id, new_balance)?;
            tx.insert_entry(&LedgerEntry::new(
                wallet.id,
                EntryKind::Deposit,
                amount,
                EntryStatus::Success,
            ))?;
            Ok(new_balance)
        });
        drop(guard);

        match result {
            Ok(new_balance) => {
                self.cache.set_balance(target.id, new_balance, self.cache_ttl);
                self.cache.invalidate_transactions(target.id);
                self.notifier.notify(NotifyEvent::AdminDeposit {
                    email: target.email.clone(),
                    amount,
                });
                self.audit.record(&format!(
                    "Admin deposit SUCCESS admin_id={} user_id={} amount={}",
                    admin_id, target.id, amount
                ));
                Ok(new_balance)
            }
            Err(e) => {
                if let Some(wallet_id) = touched {
                    self.record_failed(
                        LedgerEntry::new(wallet_id, EntryKind::Deposit, amount, EntryStatus::Failed),
                        &[target.id],
                    );
                }
                self.audit.record(&format!(
                    "Admin deposit FAILED admin_id={} email={} amount={}",
                    admin_id, target_email, amount
                ));
                Err(e)
            }
        }
    }

    /// Write the FAILED bookkeeping entry in its own commit scope.
    ///
    /// Best-effort by contract: a failure here is swallowed so the
    /// original error always wins. The listing cache is only evicted when
    /// the entry actually landed.
    fn record_failed(&self, entry: LedgerEntry, affected_users: &[Uuid]) {
        if self.store.record_entry(&entry).is_ok() {
            for user_id in affected_users {
                self.cache.invalidate_transactions(*user_id);
            }
        }
    }
}

fn require_admin(user: &User) -> Result<()> {
    if !user.is_admin {
        return Err(Error::validation("admin privileges required"));
    }
    Ok(())
}
