//! Configuration schema for Claimline.

use serde::{Deserialize, Serialize};

/// Root config for the Claimline service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClaimlineConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub referral: ReferralConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl ClaimlineConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ClaimlineConfigBuilder {
        ClaimlineConfigBuilder::new()
    }
}

/// Builder for assembling a `ClaimlineConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ClaimlineConfigBuilder {
    config: ClaimlineConfig,
}

impl ClaimlineConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ClaimlineConfig::default(),
        }
    }

    /// Replace the server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Replace the LLM configuration.
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Replace the chat configuration.
    pub fn chat(mut self, chat: ChatConfig) -> Self {
        self.config.chat = chat;
        self
    }

    /// Replace the retrieval configuration.
    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.config.retrieval = retrieval;
        self
    }

    /// Replace the referral configuration.
    pub fn referral(mut self, referral: ReferralConfig) -> Self {
        self.config.referral = referral;
        self
    }

    /// Replace the session persistence configuration.
    pub fn sessions(mut self, sessions: SessionsConfig) -> Self {
        self.config.sessions = sessions;
        self
    }

    /// Finalize and return the built `ClaimlineConfig`.
    pub fn build(self) -> ClaimlineConfig {
        self.config
    }
}

/// HTTP/websocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// External chat-completions provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Environment variable holding the API key; never the key itself.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

/// Per-exchange chat limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum user message length in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    /// Number of recent messages included in the prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    /// Minimum extracted text length for a document to be analysable.
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,
    /// How much extracted text is retained in storage.
    #[serde(default = "default_stored_text_chars")]
    pub stored_text_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            history_window: default_history_window(),
            max_document_bytes: default_max_document_bytes(),
            min_document_chars: default_min_document_chars(),
            stored_text_chars: default_stored_text_chars(),
        }
    }
}

fn default_max_message_chars() -> usize {
    1000
}

fn default_history_window() -> usize {
    6
}

fn default_max_document_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_min_document_chars() -> usize {
    50
}

fn default_stored_text_chars() -> usize {
    10_000
}

/// Knowledge retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum citations attached to a reply.
    #[serde(default = "default_max_citations")]
    pub max_citations: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_citations: default_max_citations(),
        }
    }
}

fn default_max_citations() -> usize {
    5
}

/// Solicitor referral settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralConfig {
    /// Maximum solicitor firms surfaced per reply.
    #[serde(default = "default_max_solicitors")]
    pub max_solicitors: usize,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            max_solicitors: default_max_solicitors(),
        }
    }
}

fn default_max_solicitors() -> usize {
    3
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_sessions_enabled")]
    pub enabled: bool,
    /// Path to the SQLite database file. Relative paths resolve against
    /// the working directory; absent means a per-user data directory.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_sessions_enabled(),
            path: None,
        }
    }
}

fn default_sessions_enabled() -> bool {
    true
}
