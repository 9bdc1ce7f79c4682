//! CLI subcommand implementations.

pub mod checkin;
pub mod delete;
pub mod drinks;
pub mod edit;
pub mod log;
pub mod patterns;
pub mod prefs;
pub mod profile;
pub mod status;
pub mod util;
pub mod watch;
