use std::path::PathBuf;

use promochat_types::BackendMode;

pub mod factory;
pub mod prompts;

pub use factory::ClientFactory;

/// Backend type for chat adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Hosted multi-provider relay
    Relay,
    /// Locally-run model server
    Local,
}

impl BackendType {
    /// Parse backend type from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relay" | "remote" | "hosted" => Some(Self::Relay),
            "local" | "ollama" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn mode(&self) -> BackendMode {
        match self {
            Self::Relay => BackendMode::Remote,
            Self::Local => BackendMode::Local,
        }
    }
}

/// Default hosted relay URL
pub const DEFAULT_RELAY_URL: &str = "https://relay.promochat.app/api";

/// Default local model server URL
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434";

/// Default model names for each backend
pub const DEFAULT_RELAY_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LOCAL_MODEL: &str = "qwen2.5:7b";

/// Normalize a base URL: trim whitespace and trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Settings for the hosted relay adapter
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    /// Dump every request to the console
    pub verbose: bool,
    /// Also write request dumps into this directory
    pub request_log_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELAY_URL.to_string(),
            api_key: None,
            model: DEFAULT_RELAY_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 800,
            system_prompt: prompts::RELAY_SYSTEM_PROMPT.to_string(),
            verbose: false,
            request_log_dir: None,
        }
    }
}

/// Settings for the local model server adapter
#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub system_prompt: String,
    pub verbose: bool,
    pub request_log_dir: Option<PathBuf>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_URL.to_string(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            temperature: 0.8,
            top_p: 0.9,
            system_prompt: prompts::LOCAL_SYSTEM_PROMPT.to_string(),
            verbose: false,
            request_log_dir: None,
        }
    }
}
