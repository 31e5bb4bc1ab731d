//! Settings loading and validation for the voice gateway.

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{
    IdentityConfig, ModelConfig, ObservabilityConfig, RepositoryBackend, RepositoryConfig,
    ServerConfig, Settings, load_settings,
};
