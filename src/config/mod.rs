use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub points: PointsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Email of the development owner account. A session with this email
    /// resolves to a synthetic `owner` caller without a member row.
    pub owner_email: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub uploads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "uploads".to_string(),
        }
    }
}

/// Point categories arrive as a JSON array string so they can be supplied
/// through a single environment variable, matching how deployments already
/// configure them. Parsed and normalized by `PointConfig::parse`.
#[derive(Debug, Deserialize, Clone)]
pub struct PointsConfig {
    pub types_json: String,
    pub max_boost: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            types_json: "[]".to_string(),
            max_boost: 5,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.max_connections", 10)?
            .set_default("storage.uploads_dir", "uploads")?
            .set_default("points.types_json", "[]")?
            .set_default("points.max_boost", 5)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with LAUREL__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("LAUREL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://laurel.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig { owner_email: None },
            storage: StorageConfig::default(),
            points: PointsConfig::default(),
        }
    }
}
