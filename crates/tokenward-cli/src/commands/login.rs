//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use tokenward_core::{CancelSignal, Credentials};
use tokenward_session::Persistence;

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Stay signed in across runs
    #[arg(long)]
    pub trust_device: bool,
}

pub async fn run(api: &str, args: LoginArgs) -> Result<()> {
    let mut app = App::open(api)?;
    let credentials = Credentials::new(&args.username, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let identity = app
        .auth
        .login(&credentials, &CancelSignal::never())
        .await
        .context("Failed to login")?;

    app.set_persistence(Persistence::from(args.trust_device))?;
    app.store_cookies()?;

    output::success("Logged in successfully");
    println!();
    output::identity(&identity);
    output::field("Remembered", &app.persistence().to_string());

    Ok(())
}
