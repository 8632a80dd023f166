//! Subcommand implementations.

pub mod login;
mod logout;
pub mod persist;
mod refresh;
pub mod register;
pub mod users;
mod whoami;

use anyhow::Result;
use tracing::{debug, warn};

use tokenward_core::{CancelHandle, CancelSignal};
use tokenward_http::HttpTransport;
use tokenward_session::{BootstrapOutcome, Bootstrapper};

use crate::app::App;
use crate::cli::{Cli, Commands};

pub async fn handle(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register(args) => register::run(&cli.api, args).await,
        Commands::Login(args) => login::run(&cli.api, args).await,
        Commands::Logout => logout::run(&cli.api).await,
        Commands::Users(args) => users::run(&cli.api, args).await,
        Commands::Whoami => whoami::run(&cli.api).await,
        Commands::Refresh => refresh::run(&cli.api).await,
        Commands::Persist(args) => persist::run(args),
    }
}

/// A cancel signal tripped by Ctrl-C.
///
/// The handle lives in a background task for the rest of the process.
fn interruptible() -> CancelSignal {
    let handle = CancelHandle::new();
    let signal = handle.signal();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted");
            handle.cancel();
        }
    });

    signal
}

/// Resume the remembered session before anything protected runs.
async fn resume(app: &App) -> Bootstrapper<HttpTransport> {
    let bootstrapper = app.bootstrapper();
    let outcome = bootstrapper.run().await;
    debug!(?outcome, "Bootstrap resolved");

    if outcome == BootstrapOutcome::Unavailable {
        warn!("Could not resume the previous session");
    }

    bootstrapper
}
