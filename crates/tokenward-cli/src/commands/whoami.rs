//! Whoami command implementation.

use anyhow::{Result, bail};

use tokenward_session::BootstrapOutcome;

use super::resume;
use crate::app::App;
use crate::output;

pub async fn run(api: &str) -> Result<()> {
    let app = App::open(api)?;

    let bootstrapper = resume(&app).await;
    let outcome = bootstrapper.run().await;
    app.store_cookies()?;

    match outcome {
        BootstrapOutcome::Resumed(identity) => {
            output::identity(&identity);
            output::field("Remembered", &app.persistence().to_string());
            Ok(())
        }
        BootstrapOutcome::Denied => Err(tokenward_core::Error::AuthDenied.into()),
        BootstrapOutcome::Unavailable => bail!("Backend unavailable; could not resume session"),
        BootstrapOutcome::Skipped => bail!("Not logged in. Use 'tokenward login' to sign in."),
    }
}
