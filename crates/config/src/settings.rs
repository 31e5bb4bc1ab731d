//! Gateway settings, loaded from `config/default.toml` (+ an optional
//! environment-specific file) layered under `GATEWAY__`-prefixed env vars.

use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Identity issuer configuration — spec's `region`/`userPoolId`/`clientId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            user_pool_id: String::new(),
            client_id: String::new(),
        }
    }
}

impl IdentityConfig {
    /// The well-known JWKS URL derived from `{region, userPoolId}`.
    pub fn jwks_url(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
            self.region, self.user_pool_id
        )
    }

    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }
}

/// Model-stream tuning — max concurrent streams, idle timeout, endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: String,
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: usize,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_max_concurrent_streams() -> usize {
    256
}

fn default_idle_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://model.invalid/stream".to_string(),
            max_concurrent_streams: default_max_concurrent_streams(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

/// HTTP/WebSocket server binding and CORS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_origins: Vec::new(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    #[default]
    Memory,
    Scylla,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub backend: RepositoryBackend,
    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,
    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    vec!["127.0.0.1:9042".to_string()]
}

fn default_scylla_keyspace() -> String {
    "voice_gateway".to_string()
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            backend: RepositoryBackend::default(),
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Top-level settings object.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_model()?;
        self.validate_server()?;
        self.validate_observability()?;
        Ok(())
    }

    fn validate_model(&self) -> Result<(), ConfigError> {
        if self.model.max_concurrent_streams == 0 {
            return Err(ConfigError::InvalidValue {
                field: "model.max_concurrent_streams".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.model.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "model.idle_timeout_secs".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue {
                field: "server.bind_addr".to_string(),
                message: format!("not a valid socket address: {}", self.server.bind_addr),
            });
        }
        Ok(())
    }

    fn validate_observability(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.observability.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: format!(
                    "must be one of {:?}, got {:?}",
                    VALID_LOG_LEVELS, self.observability.log_level
                ),
            });
        }
        Ok(())
    }
}

/// Load settings from `config/default.{toml,yaml,...}`, an optional
/// `config/{env}` overlay, and `GATEWAY__`-prefixed environment variables,
/// in that priority order (env vars win).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("GATEWAY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_max_concurrent_streams_is_rejected() {
        let mut settings = Settings::default();
        settings.model.max_concurrent_streams = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let mut settings = Settings::default();
        settings.server.bind_addr = "not-an-address".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn jwks_url_is_derived_from_region_and_pool() {
        let identity = IdentityConfig {
            region: "ap-south-1".to_string(),
            user_pool_id: "pool-123".to_string(),
            client_id: "client-abc".to_string(),
        };
        assert_eq!(
            identity.jwks_url(),
            "https://cognito-idp.ap-south-1.amazonaws.com/pool-123/.well-known/jwks.json"
        );
    }
}
