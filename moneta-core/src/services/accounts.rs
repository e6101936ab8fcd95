//! Account service - registration and administrative user management
//!
//! These operations mutate user identity and gate flags, never balances.
//! Registration provisions the wallet in the same commit as the user row
//! so a registered user always has exactly one wallet.

use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::DuckDbStore;
use crate::domain::result::{Error, Result};
use crate::domain::{User, Wallet};
use crate::ports::{AuditSink, Notifier, NotifyEvent};
use crate::services::wallet::{views_from, TransactionView};

/// User registration and admin management
pub struct AccountService {
    store: Arc<DuckDbStore>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
}

impl AccountService {
    pub fn new(
        store: Arc<DuckDbStore>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            notifier,
            audit,
        }
    }

    /// Register a new user with a zero-balance wallet
    pub fn register(&self, name: &str, email: &str) -> Result<User> {
        self.register_with_role(name, email, false)
    }

    /// Register a new administrator
    pub fn register_admin(&self, name: &str, email: &str) -> Result<User> {
        self.register_with_role(name, email, true)
    }

    fn register_with_role(&self, name: &str, email: &str, is_admin: bool) -> Result<User> {
        let mut user = User::new(Uuid::new_v4(), name, email);
        user.is_admin = is_admin;
        user.validate().map_err(Error::validation)?;

        if self.store.get_user_by_email(&user.email)?.is_some() {
            return Err(Error::validation("Email already registered"));
        }

        let wallet = Wallet::new(Uuid::new_v4(), user.id);
        self.store.with_commit(|tx| {
            tx.insert_user(&user)?;
            tx.insert_wallet(&wallet)
        })?;

        self.audit
            .record(&format!("Registered user_id={} email={}", user.id, user.email));
        Ok(user)
    }

    /// Freeze a user's account; frozen accounts cannot move money
    pub fn freeze(&self, admin_id: Uuid, email: &str) -> Result<()> {
        let admin = self.require_admin(admin_id)?;
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| Error::not_found(format!("user {}", email)))?;
        if user.id == admin.id {
            return Err(Error::validation("Admin cannot freeze themselves"));
        }

        self.store.set_user_frozen(user.id, true)?;
        self.notifier
            .notify(NotifyEvent::AccountFrozen { email: user.email });
        self.audit
            .record(&format!("Freeze user_id={} by admin_id={}", user.id, admin_id));
        Ok(())
    }

    /// Lift a freeze
    pub fn unfreeze(&self, admin_id: Uuid, email: &str) -> Result<()> {
        self.require_admin(admin_id)?;
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| Error::not_found(format!("user {}", email)))?;

        self.store.set_user_frozen(user.id, false)?;
        self.notifier
            .notify(NotifyEvent::AccountUnfrozen { email: user.email });
        self.audit
            .record(&format!("Unfreeze user_id={} by admin_id={}", user.id, admin_id));
        Ok(())
    }

    /// Soft-delete a user; inactive users cannot receive transfers or
    /// deposits and cannot log in upstream
    pub fn deactivate(&self, admin_id: Uuid, email: &str) -> Result<()> {
        let admin = self.require_admin(admin_id)?;
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| Error::not_found(format!("user {}", email)))?;
        if user.id == admin.id {
            return Err(Error::validation("Admin cannot deactivate themselves"));
        }

        self.store.set_user_active(user.id, false)
    }

    /// Reactivate a soft-deleted user
    pub fn activate(&self, admin_id: Uuid, email: &str) -> Result<()> {
        self.require_admin(admin_id)?;
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| Error::not_found(format!("user {}", email)))?;

        self.store.set_user_active(user.id, true)
    }

    /// All users, oldest first
    pub fn list_users(&self, admin_id: Uuid) -> Result<Vec<User>> {
        self.require_admin(admin_id)?;
        self.store.list_users()
    }

    /// Admin view of any user's transaction log (uncached)
    pub fn user_transactions(&self, admin_id: Uuid, email: &str) -> Result<Vec<TransactionView>> {
        self.require_admin(admin_id)?;
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or_else(|| Error::not_found(format!("user {}", email)))?;
        let wallet = self
            .store
            .get_wallet_by_user(user.id)?
            .ok_or(Error::WalletNotFound)?;
        Ok(views_from(self.store.list_entries_with_names(wallet.id)?))
    }

    fn require_admin(&self, admin_id: Uuid) -> Result<User> {
        let admin = self
            .store
            .get_user_by_id(admin_id)?
            .ok_or_else(|| Error::not_found(format!("user {}", admin_id)))?;
        if !admin.is_admin {
            return Err(Error::validation("admin privileges required"));
        }
        Ok(admin)
    }
}
