//! Balance command - show the acting user's balance

use anyhow::Result;
use serde_json::json;

use super::{get_context, resolve_user};

pub fn run(acting: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = resolve_user(&ctx, acting)?;

    let wallet = ctx.wallet_service.get_or_create_wallet(user.id)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "email": user.email,
                "balance": wallet.balance,
            }))?
        );
        return Ok(());
    }

    println!("{}: {}", user.email, wallet.balance);
    Ok(())
}
