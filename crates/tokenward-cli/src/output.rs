//! Terminal output. Results go to stdout, status and errors to stderr.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use tokenward_core::UserIdentity;

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// A follow-up the user should take, e.g. signing in again.
pub fn hint(msg: &str) {
    eprintln!("  {}", msg.yellow());
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print the signed-in user.
pub fn identity(identity: &UserIdentity) {
    field("User", &identity.name);
    field("ID", &identity.id.to_string());
}

/// Print a value as a single line of JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
