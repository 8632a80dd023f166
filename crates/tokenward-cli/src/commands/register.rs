//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tokenward_core::{CancelSignal, Credentials};

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username for the new account
    #[arg(long)]
    pub username: String,

    /// Password for the new account
    #[arg(long)]
    pub password: String,
}

pub async fn run(api: &str, args: RegisterArgs) -> Result<()> {
    let app = App::open(api)?;
    let credentials = Credentials::new(&args.username, &args.password);

    eprintln!("{}", "Registering...".dimmed());

    match app.auth.register(&credentials, &CancelSignal::never()).await {
        Ok(()) => {
            output::success("Account created");
            output::field("Username", &args.username);
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            Err(e).with_context(|| format!("Username '{}' is already taken", args.username))
        }
        Err(e) => Err(e).context("Failed to register"),
    }
}
