//! Delete command for removing a logged dose.

use anyhow::{Context, Result};
use cf_db::Database;

/// Runs the delete command.
pub fn run(db: &Database, id: &str) -> Result<()> {
    db.delete_event(id).context("failed to delete dose")?;
    println!("Deleted {id}.");
    Ok(())
}
