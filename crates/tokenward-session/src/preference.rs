//! The "remember me" preference.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the user asked to stay signed in across restarts.
///
/// Owned and stored by the application shell. The session layer only reads
/// it, once, when a [`Bootstrapper`](crate::Bootstrapper) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    On,
    #[default]
    Off,
}

impl Persistence {
    pub fn is_on(self) -> bool {
        self == Persistence::On
    }
}

impl From<bool> for Persistence {
    fn from(on: bool) -> Self {
        if on { Persistence::On } else { Persistence::Off }
    }
}

impl fmt::Display for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persistence::On => f.write_str("on"),
            Persistence::Off => f.write_str("off"),
        }
    }
}
