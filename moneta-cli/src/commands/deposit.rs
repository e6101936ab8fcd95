//! Deposit command - credit a user's wallet (admin only)

use anyhow::Result;
use serde_json::json;

use super::{get_context, parse_amount, resolve_user};
use crate::output;

pub fn run(acting: &str, target: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let admin = resolve_user(&ctx, acting)?;
    let amount = parse_amount(amount)?;

    let balance = ctx.ledger_service.deposit(admin.id, target, amount)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "target": target, "balance": balance }))?
        );
        return Ok(());
    }

    output::success(&format!("Deposited {} to {}", amount, target));
    println!("Target balance: {}", balance);
    Ok(())
}
