//! Caffeine tracker CLI library.
//!
//! This crate provides the CLI interface over the `cf-core` engine and the
//! `cf-db` store.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
