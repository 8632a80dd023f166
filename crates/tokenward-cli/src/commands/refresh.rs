//! Refresh command implementation.

use anyhow::{Result, bail};
use colored::Colorize;

use tokenward_core::Error;
use tokenward_session::RefreshOutcome;

use crate::app::App;
use crate::output;

pub async fn run(api: &str) -> Result<()> {
    let app = App::open(api)?;

    eprintln!("{}", "Refreshing session...".dimmed());

    let outcome = app.gateway.refresher().refresh().await;
    app.store_cookies()?;

    match outcome {
        RefreshOutcome::Renewed(_) => {
            output::success("Access token renewed");
            if let Some(identity) = app.gateway.session().identity() {
                output::identity(&identity);
            }
            Ok(())
        }
        RefreshOutcome::Denied => Err(Error::AuthDenied.into()),
        RefreshOutcome::TransientFailure => bail!("Refresh failed; try again later"),
    }
}
