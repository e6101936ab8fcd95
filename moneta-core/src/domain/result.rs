//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// The first group is the ledger taxonomy surfaced verbatim to callers;
/// the rest are ambient infrastructure errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Account is frozen")]
    AccountFrozen,

    #[error("Wallet not found")]
    WalletNotFound,

    #[error("Recipient not found")]
    RecipientNotFound,

    #[error("Cannot transfer to self")]
    SelfTransfer,

    #[error("Daily {0} limit exceeded")]
    DailyLimitExceeded(&'static str),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for failures of the commit infrastructure itself, as opposed
    /// to a business rule rejecting the operation.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Io(_))
    }
}

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_matches_caller_surface() {
        assert_eq!(
            Error::InvalidAmount.to_string(),
            "Amount must be greater than zero"
        );
        assert_eq!(Error::AccountFrozen.to_string(), "Account is frozen");
        assert_eq!(
            Error::DailyLimitExceeded("withdraw").to_string(),
            "Daily withdraw limit exceeded"
        );
        assert_eq!(Error::InsufficientFunds.to_string(), "Insufficient funds");
    }

    #[test]
    fn test_store_failure_classification() {
        assert!(Error::store("connection lost").is_store_failure());
        assert!(!Error::InsufficientFunds.is_store_failure());
        assert!(!Error::SelfTransfer.is_store_failure());
    }
}
