//! Drinks command for listing the built-in catalog.

use std::fmt::Write;

use anyhow::Result;
use cf_core::catalog::{CATALOG, Drink};

/// Format the catalog for human-readable output.
pub fn format_drinks(drinks: &[Drink]) -> String {
    let mut output = String::new();

    writeln!(output, "{:<16}  {:<16}  {:>6}", "ID", "Name", "mg").unwrap();
    writeln!(output, "────────────────  ────────────────  ──────").unwrap();
    for drink in drinks {
        writeln!(
            output,
            "{:<16}  {:<16}  {:>6.0}",
            drink.id, drink.name, drink.caffeine_mg
        )
        .unwrap();
    }
    writeln!(output).unwrap();
    writeln!(
        output,
        "Tip: Use 'cf log --mg <amount> --name <name>' for anything not listed."
    )
    .unwrap();

    output
}

/// Runs the drinks command.
pub fn run() -> Result<()> {
    print!("{}", format_drinks(CATALOG));
    Ok(())
}
