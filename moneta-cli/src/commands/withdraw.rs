//! Withdraw command - debit the acting user's wallet

use anyhow::Result;
use serde_json::json;

use super::{get_context, parse_amount, resolve_user};
use crate::output;

pub fn run(acting: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = resolve_user(&ctx, acting)?;
    let amount = parse_amount(amount)?;

    let balance = ctx.ledger_service.withdraw(user.id, amount)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "balance": balance }))?
        );
        return Ok(());
    }

    output::success(&format!("Withdrew {}", amount));
    println!("New balance: {}", balance);
    Ok(())
}
