//! On-disk state owned by the shell: the preference and the cookie jar.
//!
//! The access token is never written anywhere.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use tokenward_session::Persistence;

/// Stored preference file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreference {
    persist: Persistence,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "tokenward").context("Could not determine config directory")
}

fn preference_path() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let config_dir = dirs.config_dir();
    fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    Ok(config_dir.join("preference.json"))
}

/// Path of the saved cookie jar.
pub fn jar_path() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    Ok(data_dir.join("cookies.json"))
}

/// Load the "remember me" preference. Missing means off.
pub fn load_preference() -> Result<Persistence> {
    let path = preference_path()?;

    if !path.exists() {
        return Ok(Persistence::Off);
    }

    let json = fs::read_to_string(&path).context("Failed to read preference file")?;
    let stored: StoredPreference =
        serde_json::from_str(&json).context("Invalid preference file")?;
    Ok(stored.persist)
}

/// Save the "remember me" preference.
pub fn save_preference(persist: Persistence) -> Result<()> {
    let path = preference_path()?;
    let json = serde_json::to_string_pretty(&StoredPreference { persist })?;
    fs::write(&path, json).context("Failed to write preference file")?;
    Ok(())
}

/// Remove the saved cookie jar, if any.
pub fn clear_jar() -> Result<()> {
    let path = jar_path()?;

    if path.exists() {
        fs::remove_file(&path).context("Failed to remove cookie jar")?;
    }

    Ok(())
}
