//! Register command - create a user with a zero-balance wallet

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(name: &str, email: &str, admin: bool) -> Result<()> {
    let ctx = get_context()?;

    let user = if admin {
        ctx.account_service.register_admin(name, email)?
    } else {
        ctx.account_service.register(name, email)?
    };

    let role = if user.is_admin { "admin" } else { "user" };
    output::success(&format!("Registered {} {} <{}>", role, user.name, user.email));
    output::info(&format!("User id: {}", user.id));
    Ok(())
}
