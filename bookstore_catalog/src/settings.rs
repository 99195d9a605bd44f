use anyhow::Context;
use serde::Deserialize;

/// Env var pointing at an optional YAML/TOML settings file.
pub const CONFIG_FILE_ENV: &str = "BOOKSTORE_CONFIG";
/// Prefix for env-var overrides, e.g. `BOOKSTORE_DATABASE__HOST`.
pub const ENV_PREFIX: &str = "BOOKSTORE";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Postgres,
    InMemory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub username: String,
    #[serde(default = "default_db_password")]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub dbname: String,
    #[serde(default = "default_db_sslmode")]
    pub sslmode: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            username: default_db_user(),
            password: default_db_password(),
            dbname: default_db_name(),
            sslmode: default_db_sslmode(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Jaeger agent `host:port`; the exporter's own default applies when unset.
    #[serde(default)]
    pub agent_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            agent_endpoint: None,
        }
    }
}

impl Settings {
    /// Layers an optional settings file (path in `BOOKSTORE_CONFIG`) under
    /// `BOOKSTORE_`-prefixed env vars. Any failure here is fatal to startup.
    pub fn load() -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path));
        }
        let cfg = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to read configuration")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "bookstore".to_string()
}

fn default_db_sslmode() -> String {
    "disable".to_string()
}

fn default_service_name() -> String {
    "bookstore_catalog".to_string()
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.database.backend, StorageBackend::Postgres);
        assert_eq!(settings.database.port, 5432);
        assert_eq!(settings.database.sslmode, "disable");
        assert_eq!(settings.telemetry.service_name, "bookstore_catalog");
        assert!(settings.telemetry.agent_endpoint.is_none());
    }

    #[test]
    fn backend_names_deserialize_snake_case() {
        let settings: Settings =
            serde_json::from_value(serde_json::json!({"database": {"backend": "in_memory"}}))
                .unwrap();
        assert_eq!(settings.database.backend, StorageBackend::InMemory);
    }
}
