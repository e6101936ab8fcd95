//! Moneta CLI - wallet ledger in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{balance, deposit, register, transactions, transfer, users, withdraw};

/// Moneta - wallet ledger in your terminal
#[derive(Parser)]
#[command(name = "mnt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user with a zero-balance wallet
    Register {
        /// Display name
        name: String,
        /// Unique email address
        email: String,
        /// Register as an administrator
        #[arg(long)]
        admin: bool,
    },

    /// Show the acting user's balance
    Balance {
        /// Acting user's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw from the acting user's wallet
    Withdraw {
        /// Amount with up to two decimal places
        amount: String,
        /// Acting user's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transfer money to another user
    Transfer {
        /// Recipient's email
        recipient: String,
        /// Amount with up to two decimal places
        amount: String,
        /// Acting user's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit a user's wallet (admin only)
    Deposit {
        /// Target user's email
        target: String,
        /// Amount with up to two decimal places
        amount: String,
        /// Acting admin's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the acting user's transactions, newest first
    Transactions {
        /// Acting user's email
        #[arg(long = "as", value_name = "EMAIL")]
        acting: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Administer users
    Users {
        #[command(subcommand)]
        command: users::UserCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { name, email, admin } => register::run(&name, &email, admin),
        Commands::Balance { acting, json } => balance::run(&acting, json),
        Commands::Withdraw { amount, acting, json } => withdraw::run(&acting, &amount, json),
        Commands::Transfer { recipient, amount, acting, json } => {
            transfer::run(&acting, &recipient, &amount, json)
        }
        Commands::Deposit { target, amount, acting, json } => {
            deposit::run(&acting, &target, &amount, json)
        }
        Commands::Transactions { acting, json } => transactions::run(&acting, json),
        Commands::Users { command } => users::run(command),
    }
}
