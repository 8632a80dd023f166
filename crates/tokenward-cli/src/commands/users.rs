//! Users command implementation.

use anyhow::{Context, Result};
use clap::Args;

use tokenward_session::users::list_users;

use super::{interruptible, resume};
use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(api: &str, args: UsersArgs) -> Result<()> {
    let app = App::open(api)?;
    let cancel = interruptible();

    if let Some(err) = resume(&app).await.run().await.error() {
        app.store_cookies()?;
        return Err(err.into());
    }

    let result = list_users(&app.gateway, &cancel).await;

    // A renewal during the call may have rotated the refresh cookie.
    app.store_cookies()?;

    let users = result.context("Failed to list users")?;

    if args.json {
        return output::json(&users);
    }

    if users.is_empty() {
        println!("No users");
    }
    for user in &users {
        println!("{}", user.username);
    }

    Ok(())
}
