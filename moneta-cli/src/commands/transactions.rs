//! Transactions command - list the acting user's ledger, newest first

use anyhow::Result;

use moneta_core::TransactionView;

use super::{get_context, resolve_user};
use crate::output;

pub fn run(acting: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = resolve_user(&ctx, acting)?;

    let listing = ctx.wallet_service.list_transactions(user.id)?;
    print_listing(&listing, json)
}

pub fn print_listing(listing: &[TransactionView], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(listing)?);
        return Ok(());
    }

    if listing.is_empty() {
        output::info("No transactions");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Type", "Amount", "Status", "Counterparty"]);
    for view in listing {
        table.add_row(vec![
            view.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            view.kind.as_str().to_string(),
            view.amount.to_string(),
            view.status.as_str().to_string(),
            view.counterparty_name.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
