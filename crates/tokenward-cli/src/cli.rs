//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{login, persist, register, users};

/// Session-aware client for a token-issuing backend.
#[derive(Parser, Debug)]
#[command(name = "tokenward")]
#[command(author, version = env!("TOKENWARD_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Backend base URL
    #[arg(
        long,
        env = "TOKENWARD_API",
        default_value = "http://localhost:3500",
        global = true
    )]
    pub api: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account
    Register(register::RegisterArgs),

    /// Sign in
    Login(login::LoginArgs),

    /// Sign out and forget the saved session
    Logout,

    /// List users (protected)
    Users(users::UsersArgs),

    /// Show the signed-in user, resuming a remembered session if needed
    Whoami,

    /// Renew the access token once and report the outcome
    Refresh,

    /// Show or change the "remember me" preference
    Persist(persist::PersistArgs),
}
