//! Configuration schema and loader for Claimline.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{default_config_path, load_config, load_config_from_path};
pub use model::{
    ChatConfig, ClaimlineConfig, ClaimlineConfigBuilder, LlmConfig, ReferralConfig,
    RetrievalConfig, ServerConfig, SessionsConfig,
};
