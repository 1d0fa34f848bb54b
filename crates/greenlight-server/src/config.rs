use std::{path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use greenlight_app::state::AppConfig;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 4000,
        env = "GREENLIGHT_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "GREENLIGHT_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "GREENLIGHT_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/greenlight.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "GREENLIGHT_DATA_DIR",
        help = "Data directory for the database, default is system default like ~/.local/share/greenlight",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "GREENLIGHT_DB_MAX_CONNECTIONS",
        default_value_t = greenlight_dal::DEFAULT_MAX_CONNECTIONS,
        help = "Maximum number of open database connections"
    )]
    pub max_connections: u32,

    #[arg(
        long,
        env = "GREENLIGHT_QUERY_TIMEOUT",
        default_value = "3s",
        help = "Timeout for a single database operation in human friendly format (e.g. 3s, 500ms)",
        value_parser = humantime::parse_duration
    )]
    pub query_timeout: Duration,

    #[arg(
        long,
        env = "GREENLIGHT_DEFAULT_PAGE_SIZE",
        default_value_t = greenlight_dal::filters::DEFAULT_PAGE_SIZE,
        help = "Page size used when a listing request does not give one"
    )]
    pub default_page_size: u32,

    #[arg(
        short,
        long,
        env = "GREENLIGHT_ENV",
        default_value = "development",
        help = "Environment name reported by healthcheck (development|staging|production)"
    )]
    pub env: String,

    #[arg(long, env = "GREENLIGHT_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("greenlight"))
        .unwrap_or_else(|| PathBuf::from("greenlight"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/greenlight.db", self.data_dir))
    }

    /// True when the database lives in the default location under data dir.
    pub fn uses_data_dir(&self) -> bool {
        self.database_url.is_none()
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            environment: config.env.clone(),
            default_page_size: config.default_page_size,
            query_timeout: config.query_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["greenlight", "--data-dir", "/tmp/gl"]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.listen_address, "127.0.0.1");
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.query_timeout, Duration::from_secs(3));
        assert_eq!(config.default_page_size, 20);
        assert!(!config.cors);
        assert_eq!(config.database_url(), "sqlite:///tmp/gl/greenlight.db");
        assert!(config.uses_data_dir());

        let app_config = AppConfig::from(&config);
        assert_eq!(app_config.environment, "development");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "greenlight",
            "--database-url",
            "sqlite::memory:",
            "--query-timeout",
            "500ms",
            "--env",
            "staging",
            "--cors",
        ])
        .unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert!(!config.uses_data_dir());
        assert_eq!(config.query_timeout, Duration::from_millis(500));
        assert!(config.cors);
        assert_eq!(AppConfig::from(&config).environment, "staging");
    }
}
