use std::env;

use config::{Config, ConfigError, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

use crate::books_repository::PostgresBooksRepositoryConfig;

const DEFAULT_CONFIG_FILE: &str = "config/bookservice_library";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub use_in_memory: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
    pub max_connections: usize,
}

#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Loads settings from defaults, then the optional config file, then `BOOKSERVICE__*` env variables.
    /// The config file path can be changed with `BOOKSERVICE_CONFIG`
    pub fn load() -> Result<Self, ConfigError> {
        let config_file =
            env::var("BOOKSERVICE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::builder()?
            .add_source(File::with_name(&config_file).required(false))
            .add_source(
                Environment::with_prefix("BOOKSERVICE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("database.use_in_memory", false)?
            .set_default("database.host", "127.0.0.1")?
            .set_default("database.port", 5432_i64)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.dbname", "postgres")?
            .set_default("database.max_connections", 16_i64)?
            .set_default("auth.jwt_algorithm", "HS256")
    }
}

impl From<&DatabaseSettings> for PostgresBooksRepositoryConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            hostname: settings.host.clone(),
            port: settings.port,
            username: settings.username.clone(),
            password: settings.password.clone(),
            dbname: settings.dbname.clone(),
            max_connections: settings.max_connections,
        }
    }
}

#[cfg(test)]
mod settings_tests {
    use config::FileFormat;
    use jsonwebtoken::Algorithm;

    use crate::settings::Settings;

    fn from_toml(toml: &str) -> Result<Settings, config::ConfigError> {
        Settings::builder()?
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_with_secret() {
        let settings = from_toml(
            r#"
            [auth]
            jwt_secret = "s3cret"
            "#,
        )
        .expect("Failed to load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.database.use_in_memory);
        assert_eq!(settings.database.port, 5432);
        assert_eq!(settings.database.max_connections, 16);
        assert_eq!(settings.auth.jwt_secret, "s3cret");
        assert_eq!(settings.auth.jwt_algorithm, Algorithm::HS256);
        assert!(!format!("{:?}", settings).contains("s3cret"));
    }

    #[test]
    fn test_secret_is_required() {
        assert!(from_toml("").is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = from_toml(
            r#"
            [server]
            port = 9000

            [database]
            use_in_memory = true

            [auth]
            jwt_secret = "other"
            jwt_algorithm = "HS512"
            "#,
        )
        .expect("Failed to load settings");

        assert_eq!(settings.server.port, 9000);
        assert!(settings.database.use_in_memory);
        assert_eq!(settings.auth.jwt_algorithm, Algorithm::HS512);
    }
}
