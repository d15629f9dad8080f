//! `selic.toml` loading.
//!
//! Every section and key is optional; anything left out takes the value
//! from [`Config::default`]. A missing file is the same as an empty one.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "selic-history.db"
//!
//! [simulation]
//! max_term_months = 360
//!
//! [logging]
//! level = "info"
//! file = "selic.log"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use selic_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Longest term a simulation may request unless configured otherwise.
pub const DEFAULT_MAX_TERM_MONTHS: u32 = 360;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseSection,
    pub simulation: SimulationSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            backend: db.backend,
            connection_string: db.connection_string,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    pub max_term_months: u32,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            max_term_months: DEFAULT_MAX_TERM_MONTHS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Bare level or full filter directive, e.g. `"debug"` or
    /// `"info,selic_core=debug"`.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Values given on the command line; each one that is set replaces the
/// file's value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    /// Reads and validates the file at `path`, falling back to defaults
    /// when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("database.backend is empty".into()));
        }
        if self.database.connection_string.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.connection_string is empty".into(),
            ));
        }
        if self.simulation.max_term_months == 0 {
            return Err(ConfigError::Invalid(
                "simulation.max_term_months must be at least 1".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level is empty".into()));
        }
        Ok(())
    }

    /// Applies command-line overrides, then re-validates.
    pub fn with_overrides(
        mut self,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.database.connection_string = connection_string;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection_string.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("inline.toml"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.simulation.max_term_months, 360);
        assert_eq!(config.db_config(), DbConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            [simulation]
            max_term_months = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.max_term_months, 120);
        assert_eq!(config.database, DatabaseSection::default());
    }

    #[test]
    fn zero_max_term_is_rejected() {
        let result = parse(
            r#"
            [simulation]
            max_term_months = 0
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let result = parse(
            r#"
            [database]
            engine = "sqlite"
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let result = parse(
            r#"
            [simulation]
            max_term_months = "forever"
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!(
            "selic-no-such-config-{}.toml",
            std::process::id()
        ));

        let config = Config::load(&path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = Config::default()
            .with_overrides(Overrides {
                backend: None,
                connection_string: Some(":memory:".to_string()),
                log_level: Some("debug".to_string()),
            })
            .unwrap();

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_override_is_rejected() {
        let result = Config::default().with_overrides(Overrides {
            backend: Some(String::new()),
            ..Overrides::default()
        });

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
