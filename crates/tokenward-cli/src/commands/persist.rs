//! Persist command implementation.

use anyhow::Result;
use clap::{Args, ValueEnum};

use tokenward_session::Persistence;

use crate::{output, storage};

#[derive(Args, Debug)]
pub struct PersistArgs {
    /// New setting; omit to show the current one
    #[arg(value_enum)]
    pub action: Option<PersistAction>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PersistAction {
    On,
    Off,
    Show,
}

pub fn run(args: PersistArgs) -> Result<()> {
    let persistence = match args.action.unwrap_or(PersistAction::Show) {
        PersistAction::Show => storage::load_preference()?,
        PersistAction::On => {
            storage::save_preference(Persistence::On)?;
            output::success("Sessions will be remembered");
            Persistence::On
        }
        PersistAction::Off => {
            storage::save_preference(Persistence::Off)?;
            storage::clear_jar()?;
            output::success("Sessions will not be remembered");
            Persistence::Off
        }
    };

    output::field("Remembered", &persistence.to_string());
    Ok(())
}
