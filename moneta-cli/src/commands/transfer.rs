//! Transfer command - move money to another user

use anyhow::Result;
use serde_json::json;

use super::{get_context, parse_amount, resolve_user};
use crate::output;

pub fn run(acting: &str, recipient: &str, amount: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = resolve_user(&ctx, acting)?;
    let amount = parse_amount(amount)?;

    let balance = ctx.ledger_service.transfer(user.id, recipient, amount)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "balance": balance }))?
        );
        return Ok(());
    }

    output::success(&format!("Transferred {} to {}", amount, recipient));
    println!("New balance: {}", balance);
    Ok(())
}
