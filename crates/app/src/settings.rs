//! Settings for the application, read from `settings.toml` (optional) and
//! `SPLITLEDGER__*` environment variables, e.g. `SPLITLEDGER__SERVER__PORT`.
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

const SETTINGS_FILE: &str = "settings";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the ledger lives: `database = "memory"` or
/// `database = { sqlite = "path/to/file.db" }`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(
            Config::builder()
                .add_source(File::with_name(SETTINGS_FILE).required(false))
                .add_source(Environment::with_prefix("SPLITLEDGER").separator("__")),
        )
    }

    #[cfg(test)]
    fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(raw, config::FileFormat::Toml)))
    }

    fn build(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_server() {
        let settings = Settings::from_toml(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "ledger.db" }
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert!(server.bind.is_none());
        assert_eq!(server.database, Database::Sqlite("ledger.db".to_string()));
    }

    #[test]
    fn memory_database_and_default_level() {
        let settings = Settings::from_toml(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 8080
            database = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.unwrap().database, Database::Memory);
    }

    #[test]
    fn server_is_optional() {
        let settings = Settings::from_toml("").unwrap();
        assert!(settings.server.is_none());
    }
}
