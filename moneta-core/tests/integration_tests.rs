//! End-to-end tests for the wallet ledger engine
//!
//! Each test builds a full context on a temporary data directory with
//! injected collaborators and drives the public operation surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use moneta_core::adapters::MemoryCache;
use moneta_core::config::Config;
use moneta_core::domain::{EntryKind, EntryStatus, User};
use moneta_core::ports::{AuditSink, NoCache, Notifier, NotifyEvent, NullAuditSink, NullNotifier, WalletCache};
use moneta_core::{Error, MonetaContext};

/// Notifier fake that records every event it is handed
#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

impl RecordingNotifier {
    /// Recipients of events matching `predicate`, in delivery order
    fn recipients_of(&self, predicate: impl Fn(&NotifyEvent) -> bool) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| predicate(e))
            .map(|e| e.recipient().to_string())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: NotifyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

struct Harness {
    _dir: TempDir,
    ctx: MonetaContext,
    notifier: Arc<RecordingNotifier>,
    admin: User,
}

/// Context with a recording notifier and no cache
fn harness() -> Harness {
    harness_with_cache(Arc::new(NoCache))
}

fn harness_with_cache(cache: Arc<dyn WalletCache>) -> Harness {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let audit: Arc<dyn AuditSink> = Arc::new(NullAuditSink);
    let ctx = MonetaContext::with_collaborators(
        dir.path(),
        Config::default(),
        cache,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        audit,
    )
    .unwrap();
    let admin = ctx
        .account_service
        .register_admin("Root", "root@example.com")
        .unwrap();
    Harness {
        _dir: dir,
        ctx,
        notifier,
        admin,
    }
}

impl Harness {
    fn register(&self, name: &str, email: &str) -> User {
        self.ctx.account_service.register(name, email).unwrap()
    }

    fn fund(&self, email: &str, cents: i64) {
        self.ctx
            .ledger_service
            .deposit(self.admin.id, email, dec(cents))
            .unwrap();
    }

    fn entries_for(&self, user_id: Uuid) -> Vec<moneta_core::LedgerEntry> {
        let wallet = self.ctx.store.get_wallet_by_user(user_id).unwrap().unwrap();
        self.ctx.store.list_entries_for_wallet(wallet.id).unwrap()
    }
}

#[test]
fn test_registration_provisions_wallet_at_zero() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");

    let wallet = h.ctx.wallet_service.get_or_create_wallet(user.id).unwrap();
    assert_eq!(wallet.user_id, user.id);
    assert_eq!(wallet.balance, Decimal::ZERO);

    // Second call returns the same wallet
    let again = h.ctx.wallet_service.get_or_create_wallet(user.id).unwrap();
    assert_eq!(again.id, wallet.id);
}

#[test]
fn test_duplicate_email_rejected() {
    let h = harness();
    h.register("Ada", "ada@example.com");
    let err = h
        .ctx
        .account_service
        .register("Imposter", "ADA@example.com")
        .unwrap_err();
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn test_withdraw_insufficient_then_exact_balance() {
    // Spec example: balance 50.00; Withdraw(50.01) fails with one FAILED
    // row; Withdraw(50.00) then succeeds and the balance reaches 0.00.
    let h = harness();
    let user = h.register("Ada", "ada@example.com");
    h.fund("ada@example.com", 50_00);

    let err = h.ctx.ledger_service.withdraw(user.id, dec(50_01)).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds));

    let balance = h.ctx.ledger_service.withdraw(user.id, dec(50_00)).unwrap();
    assert_eq!(balance, Decimal::ZERO);

    let entries = h.entries_for(user.id);
    // deposit + failed withdraw + successful withdraw
    assert_eq!(entries.len(), 3);
    let failed: Vec<_> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, EntryKind::Withdraw);
    assert_eq!(failed[0].amount, dec(50_01));
}

#[test]
fn test_transfer_daily_limit_blocks_and_records() {
    // Spec example: sender has already moved 80.00 out today; a 21.00
    // transfer fails the 100.00 ceiling, leaves both balances unchanged,
    // and writes one FAILED transfer_out row.
    let h = harness();
    let sender = h.register("Ada", "ada@example.com");
    let receiver = h.register("Grace", "grace@example.com");
    h.fund("ada@example.com", 110_00);

    h.ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(80_00))
        .unwrap();

    let err = h
        .ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(21_00))
        .unwrap_err();
    assert!(matches!(err, Error::DailyLimitExceeded(_)));

    assert_eq!(
        h.ctx.wallet_service.get_balance(sender.id).unwrap(),
        dec(30_00)
    );
    assert_eq!(
        h.ctx.wallet_service.get_balance(receiver.id).unwrap(),
        dec(80_00)
    );

    let failed: Vec<_> = h
        .entries_for(sender.id)
        .into_iter()
        .filter(|e| e.status == EntryStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, EntryKind::TransferOut);
    assert_eq!(failed[0].amount, dec(21_00));
    assert_eq!(failed[0].sender_id, Some(sender.id));
    assert_eq!(failed[0].receiver_id, Some(receiver.id));
}

#[test]
fn test_transfer_conserves_money_and_pairs_rows() {
    let h = harness();
    let sender = h.register("Ada", "ada@example.com");
    let receiver = h.register("Grace", "grace@example.com");
    h.fund("ada@example.com", 40_00);

    let total_before = h.ctx.store.sum_wallet_balances().unwrap();
    let sender_balance = h
        .ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(15_50))
        .unwrap();
    assert_eq!(sender_balance, dec(24_50));
    assert_eq!(h.ctx.store.sum_wallet_balances().unwrap(), total_before);

    let out_rows = h.entries_for(sender.id);
    let in_rows = h.entries_for(receiver.id);
    let out = out_rows
        .iter()
        .find(|e| e.kind == EntryKind::TransferOut)
        .unwrap();
    let incoming = in_rows
        .iter()
        .find(|e| e.kind == EntryKind::TransferIn)
        .unwrap();

    assert_eq!(out.amount, incoming.amount);
    assert_eq!(out.timestamp, incoming.timestamp);
    assert_eq!(out.sender_id, incoming.sender_id);
    assert_eq!(out.receiver_id, incoming.receiver_id);
    assert_eq!(out.status, EntryStatus::Success);
    assert_eq!(incoming.status, EntryStatus::Success);

    // Receiver got notified
    assert_eq!(
        h.notifier
            .recipients_of(|e| matches!(e, NotifyEvent::TransferReceived { .. })),
        vec!["grace@example.com"]
    );
}

#[test]
fn test_rejections_before_any_wallet_write_no_audit_row() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");
    h.fund("ada@example.com", 10_00);
    let entries_before = h.entries_for(user.id).len();

    // Zero and negative amounts
    assert!(matches!(
        h.ctx.ledger_service.withdraw(user.id, Decimal::ZERO),
        Err(Error::InvalidAmount)
    ));
    assert!(matches!(
        h.ctx
            .ledger_service
            .transfer(user.id, "ada@example.com", dec(-5_00)),
        Err(Error::InvalidAmount)
    ));

    // Self transfer
    assert!(matches!(
        h.ctx
            .ledger_service
            .transfer(user.id, "ada@example.com", dec(1_00)),
        Err(Error::SelfTransfer)
    ));

    // Unknown recipient
    assert!(matches!(
        h.ctx
            .ledger_service
            .transfer(user.id, "nobody@example.com", dec(1_00)),
        Err(Error::RecipientNotFound)
    ));

    assert_eq!(h.entries_for(user.id).len(), entries_before);
}

#[test]
fn test_frozen_sender_cannot_move_money() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");
    h.register("Grace", "grace@example.com");
    h.fund("ada@example.com", 20_00);

    h.ctx
        .account_service
        .freeze(h.admin.id, "ada@example.com")
        .unwrap();

    let err = h.ctx.ledger_service.withdraw(user.id, dec(5_00)).unwrap_err();
    assert!(matches!(err, Error::AccountFrozen));

    // The attempt got past wallet resolution, so it is on the record
    let failed: Vec<_> = h
        .entries_for(user.id)
        .into_iter()
        .filter(|e| e.status == EntryStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);

    // Balance unchanged; unfreeze restores access
    h.ctx
        .account_service
        .unfreeze(h.admin.id, "ada@example.com")
        .unwrap();
    assert_eq!(h.ctx.ledger_service.withdraw(user.id, dec(5_00)).unwrap(), dec(15_00));

    // Freeze + unfreeze both notified the user
    assert_eq!(
        h.notifier.recipients_of(|e| matches!(
            e,
            NotifyEvent::AccountFrozen { .. } | NotifyEvent::AccountUnfrozen { .. }
        )),
        vec!["ada@example.com", "ada@example.com"]
    );
}

#[test]
fn test_deactivated_recipient_is_invisible() {
    let h = harness();
    let sender = h.register("Ada", "ada@example.com");
    h.register("Grace", "grace@example.com");
    h.fund("ada@example.com", 20_00);

    h.ctx
        .account_service
        .deactivate(h.admin.id, "grace@example.com")
        .unwrap();

    let err = h
        .ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(5_00))
        .unwrap_err();
    assert!(matches!(err, Error::RecipientNotFound));

    h.ctx
        .account_service
        .activate(h.admin.id, "grace@example.com")
        .unwrap();
    assert!(h
        .ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(5_00))
        .is_ok());
}

#[test]
fn test_deposit_requires_admin() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");

    let err = h
        .ctx
        .ledger_service
        .deposit(user.id, "ada@example.com", dec(10_00))
        .unwrap_err();
    assert!(err.to_string().contains("admin"));
    assert_eq!(h.entries_for(user.id).len(), 0);
}

#[test]
fn test_withdraw_daily_ceiling_reachable_but_not_crossable() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");
    h.fund("ada@example.com", 500_00);

    // Reach the ceiling exactly: 60 + 40 = 100
    h.ctx.ledger_service.withdraw(user.id, dec(60_00)).unwrap();
    h.ctx.ledger_service.withdraw(user.id, dec(40_00)).unwrap();

    // One more cent is over
    let err = h.ctx.ledger_service.withdraw(user.id, dec(0_01)).unwrap_err();
    assert!(matches!(err, Error::DailyLimitExceeded(_)));

    // Withdraw and transfer ceilings are tracked independently
    h.register("Grace", "grace@example.com");
    assert!(h
        .ctx
        .ledger_service
        .transfer(user.id, "grace@example.com", dec(50_00))
        .is_ok());
}

#[test]
fn test_listing_resolves_counterparties_newest_first() {
    let h = harness();
    let sender = h.register("Ada", "ada@example.com");
    let receiver = h.register("Grace", "grace@example.com");
    h.fund("ada@example.com", 50_00);

    h.ctx
        .ledger_service
        .transfer(sender.id, "grace@example.com", dec(10_00))
        .unwrap();

    let sender_listing = h.ctx.wallet_service.list_transactions(sender.id).unwrap();
    let outgoing = sender_listing
        .iter()
        .find(|v| v.kind == EntryKind::TransferOut)
        .unwrap();
    assert_eq!(outgoing.counterparty_name.as_deref(), Some("Grace"));

    let receiver_listing = h.ctx.wallet_service.list_transactions(receiver.id).unwrap();
    assert_eq!(receiver_listing.len(), 1);
    assert_eq!(receiver_listing[0].kind, EntryKind::TransferIn);
    assert_eq!(receiver_listing[0].counterparty_name.as_deref(), Some("Ada"));

    // Newest first
    assert!(sender_listing
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
}

#[test]
fn test_cache_eviction_matches_store_truth() {
    let cache = Arc::new(MemoryCache::new());
    let h = harness_with_cache(Arc::clone(&cache) as Arc<dyn WalletCache>);
    let user = h.register("Ada", "ada@example.com");
    h.fund("ada@example.com", 75_00);

    // Warm the cache, then evict; the next read must equal the store's answer
    assert_eq!(h.ctx.wallet_service.get_balance(user.id).unwrap(), dec(75_00));
    cache.invalidate_balance(user.id);

    let from_store = h.ctx.store.get_wallet_by_user(user.id).unwrap().unwrap().balance;
    assert_eq!(h.ctx.wallet_service.get_balance(user.id).unwrap(), from_store);

    // A mutation refreshes the balance and evicts the listing
    h.ctx.wallet_service.list_transactions(user.id).unwrap();
    h.ctx.ledger_service.withdraw(user.id, dec(25_00)).unwrap();
    assert_eq!(h.ctx.wallet_service.get_balance(user.id).unwrap(), dec(50_00));
    let listing = h.ctx.wallet_service.list_transactions(user.id).unwrap();
    assert_eq!(listing.len(), 2);
}

#[test]
fn test_ledger_stays_correct_with_cold_cache() {
    // TTL zero: every cache write expires immediately, so each read
    // falls through to the store. The engine must not care.
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.cache_ttl_secs = 0;
    let ctx = MonetaContext::with_collaborators(
        dir.path(),
        config,
        Arc::new(MemoryCache::new()),
        Arc::new(NullNotifier),
        Arc::new(NullAuditSink),
    )
    .unwrap();

    let admin = ctx.account_service.register_admin("Root", "root@example.com").unwrap();
    let user = ctx.account_service.register("Ada", "ada@example.com").unwrap();
    ctx.ledger_service
        .deposit(admin.id, "ada@example.com", dec(30_00))
        .unwrap();
    assert_eq!(ctx.ledger_service.withdraw(user.id, dec(10_00)).unwrap(), dec(20_00));
    assert_eq!(ctx.wallet_service.get_balance(user.id).unwrap(), dec(20_00));
}

#[test]
fn test_admin_can_inspect_any_users_log() {
    let h = harness();
    let user = h.register("Ada", "ada@example.com");
    h.fund("ada@example.com", 10_00);
    h.ctx.ledger_service.withdraw(user.id, dec(2_50)).unwrap();

    let log = h
        .ctx
        .account_service
        .user_transactions(h.admin.id, "ada@example.com")
        .unwrap();
    assert_eq!(log.len(), 2);

    let err = h
        .ctx
        .account_service
        .user_transactions(user.id, "ada@example.com")
        .unwrap_err();
    assert!(err.to_string().contains("admin"));
}

#[test]
fn test_admin_cannot_freeze_or_deactivate_themselves() {
    let h = harness();
    assert!(h
        .ctx
        .account_service
        .freeze(h.admin.id, "root@example.com")
        .is_err());
    assert!(h
        .ctx
        .account_service
        .deactivate(h.admin.id, "root@example.com")
        .is_err());
}
