//! Logout command implementation.

use anyhow::{Context, Result};

use tokenward_core::CancelSignal;

use crate::app::App;
use crate::{output, storage};

pub async fn run(api: &str) -> Result<()> {
    let app = App::open(api)?;

    let result = app.auth.logout(&CancelSignal::never()).await;

    // Forget the refresh cookie locally whatever the backend said.
    storage::clear_jar()?;

    result.context("Backend logout failed")?;
    output::success("Logged out");
    Ok(())
}
