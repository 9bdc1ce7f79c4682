//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use cf_core::{ConfigError, DEFAULT_WINDOW_DAYS, Engine, Thresholds};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Rolling window for patterns and the profile, in days.
    pub pattern_window_days: u32,
    /// Classifier ceilings before sensitivity tiering.
    pub thresholds: Thresholds,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("pattern_window_days", &self.pattern_window_days)
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("cf.db"),
            pattern_window_days: DEFAULT_WINDOW_DAYS,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations, optionally layering a
    /// specific file on top.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // CF_DATABASE_PATH, CF_THRESHOLDS__SLEEP_SAFE_MG, ...
        figment = figment.merge(Env::prefixed("CF_").split("__"));

        figment.extract()
    }

    /// Builds the engine, rejecting unusable thresholds or window.
    pub fn engine(&self) -> Result<Engine, ConfigError> {
        Engine::new(self.thresholds, self.pattern_window_days)
    }
}

/// Returns the platform-specific config directory for cf.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cf"))
}

/// Returns the platform-specific data directory for cf.
///
/// On Linux: `~/.local/share/cf`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("cf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_cf() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "cf");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("cf.db"));
        assert_eq!(config.pattern_window_days, 30);
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn test_default_config_builds_engine() {
        let engine = Config::default().engine().unwrap();
        assert_eq!(engine.window_days(), 30);
    }

    #[test]
    fn test_config_file_overrides_nested_thresholds() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cf.toml");
        std::fs::write(
            &path,
            "pattern_window_days = 14\n\n[thresholds]\nsleep_safe_mg = 40.0\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.pattern_window_days, 14);
        assert!((config.thresholds.sleep_safe_mg - 40.0).abs() < f64::EPSILON);
        // Unset keys keep their defaults.
        assert!((config.thresholds.jitter_threshold_mg - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_misordered_thresholds_are_rejected() {
        let config = Config {
            thresholds: Thresholds {
                sleep_safe_mg: 150.0,
                ..Thresholds::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            config.engine(),
            Err(ConfigError::SleepThresholdsMisordered { .. })
        ));
    }
}
