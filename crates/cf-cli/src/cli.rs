//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Caffeine tracker.
///
/// Logs doses, models how caffeine decays through the day, and tells you
/// whether another cup is a good idea before bedtime.
#[derive(Debug, Parser)]
#[command(name = "cf", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a dose.
    Log {
        /// Catalog drink ID (see `cf drinks`).
        #[arg(long, required_unless_present = "mg")]
        drink: Option<String>,

        /// Caffeine amount in mg. Overrides the catalog amount.
        #[arg(long)]
        mg: Option<f64>,

        /// Display name for a manual entry.
        #[arg(long)]
        name: Option<String>,

        /// When the dose was consumed (RFC 3339 or e.g. "30 minutes ago").
        #[arg(long)]
        at: Option<String>,
    },

    /// Change the amount or time of a logged dose.
    Edit {
        /// Event ID.
        id: String,

        /// New caffeine amount in mg.
        #[arg(long)]
        mg: Option<f64>,

        /// New consumption time.
        #[arg(long)]
        at: Option<String>,
    },

    /// Delete a logged dose.
    Delete {
        /// Event ID.
        id: String,
    },

    /// Record last night's sleep quality.
    Checkin {
        /// Sleep quality: poor, ok or great.
        #[arg(long)]
        quality: String,

        /// Check-in date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the current caffeine level and guidance.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show consumption patterns over the rolling window.
    Patterns {
        /// Window size in days. Defaults to the configured window.
        #[arg(long)]
        days: Option<u32>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show your caffeine profile and badges.
    Profile {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or update preferences.
    Prefs {
        /// Bedtime (HH:MM).
        #[arg(long)]
        bedtime: Option<String>,

        /// Daily caffeine limit in mg.
        #[arg(long)]
        limit: Option<u32>,

        /// Sensitivity: auto, low, moderate or high.
        #[arg(long)]
        sensitivity: Option<String>,
    },

    /// Re-evaluate guidance periodically and report color changes.
    Watch {
        /// Seconds between evaluations.
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Stop after this many evaluations (runs until interrupted if unset).
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// List the built-in drink catalog.
    Drinks,
}
