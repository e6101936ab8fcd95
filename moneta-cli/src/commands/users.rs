//! User administration commands

use anyhow::Result;
use clap::Subcommand;

use super::{get_context, resolve_user, transactions};
use crate::output;

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List {
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Freeze a user's account
    Freeze {
        /// Target user's email
        email: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
    },

    /// Lift a freeze
    Unfreeze {
        /// Target user's email
        email: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
    },

    /// Deactivate (soft-delete) a user
    Deactivate {
        /// Target user's email
        email: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
    },

    /// Reactivate a user
    Activate {
        /// Target user's email
        email: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
    },

    /// Show any user's transaction log
    Log {
        /// Target user's email
        email: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: UserCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        UserCommands::List { acting, json } => {
            let admin = resolve_user(&ctx, &acting)?;
            let users = ctx.account_service.list_users(admin.id)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Name", "Email", "Active", "Admin", "Frozen"]);
            for user in &users {
                table.add_row(vec![
                    user.name.clone(),
                    user.email.clone(),
                    user.is_active.to_string(),
                    user.is_admin.to_string(),
                    user.is_frozen.to_string(),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
        UserCommands::Freeze { email, acting } => {
            let admin = resolve_user(&ctx, &acting)?;
            ctx.account_service.freeze(admin.id, &email)?;
            output::success(&format!("Froze {}", email));
            Ok(())
        }
        UserCommands::Unfreeze { email, acting } => {
            let admin = resolve_user(&ctx, &acting)?;
            ctx.account_service.unfreeze(admin.id, &email)?;
            output::success(&format!("Unfroze {}", email));
            Ok(())
        }
        UserCommands::Deactivate { email, acting } => {
            let admin = resolve_user(&ctx, &acting)?;
            ctx.account_service.deactivate(admin.id, &email)?;
            output::success(&format!("Deactivated {}", email));
            Ok(())
        }
        UserCommands::Activate { email, acting } => {
            let admin = resolve_user(&ctx, &acting)?;
            ctx.account_service.activate(admin.id, &email)?;
            output::success(&format!("Activated {}", email));
            Ok(())
        }
        UserCommands::Log { email, acting, json } => {
            let admin = resolve_user(&ctx, &acting)?;
            let listing = ctx.account_service.user_transactions(admin.id, &email)?;
            transactions::print_listing(&listing, json)
        }
    }
}
