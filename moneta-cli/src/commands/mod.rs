//! CLI command implementations

pub mod balance;
pub mod deposit;
pub mod register;
pub mod transactions;
pub mod transfer;
pub mod users;
pub mod withdraw;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;

use moneta_core::{MonetaContext, User};

/// Get the moneta directory from environment or default
pub fn get_moneta_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MONETA_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".moneta")
    }
}

/// Get or create the moneta context
pub fn get_context() -> Result<MonetaContext> {
    let moneta_dir = get_moneta_dir();

    std::fs::create_dir_all(&moneta_dir)
        .with_context(|| format!("Failed to create moneta directory: {:?}", moneta_dir))?;

    MonetaContext::new(&moneta_dir).context("Failed to initialize moneta context")
}

/// Resolve the acting identity by email.
///
/// This stands in for the auth layer: the CLI operates on a local ledger
/// and identifies principals by their registered email.
pub fn resolve_user(ctx: &MonetaContext, email: &str) -> Result<User> {
    match ctx.store.get_user_by_email(email)? {
        Some(user) if user.is_active => Ok(user),
        _ => bail!("No active user registered as {}", email),
    }
}

/// Parse a monetary amount argument
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .with_context(|| format!("Invalid amount: {}", raw))
}
