//! Notifier and audit sink ports
//!
//! Both are fire-and-forget consumers invoked only after a terminal
//! outcome is known. They must never block the operation that triggered
//! them and every failure inside an adapter is discarded.

use rust_decimal::Decimal;
use serde::Serialize;

/// An event worth telling the affected user about
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifyEvent {
    TransferReceived { email: String, amount: Decimal },
    AdminDeposit { email: String, amount: Decimal },
    AccountFrozen { email: String },
    AccountUnfrozen { email: String },
}

impl NotifyEvent {
    /// Address the notification is delivered to
    pub fn recipient(&self) -> &str {
        match self {
            NotifyEvent::TransferReceived { email, .. }
            | NotifyEvent::AdminDeposit { email, .. }
            | NotifyEvent::AccountFrozen { email }
            | NotifyEvent::AccountUnfrozen { email } => email,
        }
    }
}

/// Asynchronous, best-effort notification delivery
pub trait Notifier: Send + Sync {
    fn notify(&self, event: NotifyEvent);
}

/// Append-only freeform event log
pub trait AuditSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Notifier that drops everything; used in tests and when no endpoint is
/// configured
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: NotifyEvent) {}
}

/// Audit sink that drops everything
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _message: &str) {}
}
