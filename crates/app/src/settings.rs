//! Handles settings for the application. Configuration is read from
//! `settings.toml` (optional) and overridden by `PURSE__*` environment
//! variables, e.g. `PURSE__APP__LEVEL=debug`.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// `tracing` level for the app and the engine.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Where the ledger lives.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Throwaway in-memory database.
    Memory,
    /// SQLite file, created when missing.
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("purse.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Engine {
    /// Trust the wallet snapshots handed to the engine instead of re-reading
    /// balances.
    #[serde(default)]
    pub trusted_source: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub engine: Engine,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("PURSE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_when_empty() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database.url(), "sqlite:purse.db?mode=rwc");
        assert!(!settings.engine.trusted_source);
    }

    #[test]
    fn reads_every_section() {
        let settings = parse(
            r#"
            database = "memory"

            [app]
            level = "debug"

            [engine]
            trusted_source = true
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.database.url(), "sqlite::memory:");
        assert!(settings.engine.trusted_source);
    }

    #[test]
    fn reads_sqlite_path() {
        let settings = parse(
            r#"
            [database]
            sqlite = "/tmp/ledger.db"
            "#,
        );
        assert_eq!(settings.database.url(), "sqlite:/tmp/ledger.db?mode=rwc");
    }
}
