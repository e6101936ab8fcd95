//! User domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user and the account-state flags that gate ledger access.
///
/// Identity verification and credentials live outside this crate; by the
/// time a user id reaches the ledger it is already authenticated. The
/// flags are read-only inputs to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique across users; transfers address recipients by email.
    pub email: String,
    /// Soft delete
    pub is_active: bool,
    pub is_admin: bool,
    pub is_frozen: bool,
}

impl User {
    /// Create a new active, non-admin, non-frozen user
    pub fn new(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: Self::normalize_email(&email.into()),
            is_active: true,
            is_admin: false,
            is_frozen: false,
        }
    }

    /// Normalize email for the uniqueness check: trimmed, lowercased
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Validate user data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("user name cannot be empty");
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("email is not valid");
        }
        Ok(())
    }
}
