use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the webaudit server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the content-retrieval API.
    pub scrape_api_url: String,
    /// API key presented to the content-retrieval API.
    pub scrape_api_key: String,
    /// Base URL of the chat-completions API.
    pub llm_api_url: String,
    /// API key presented to the chat-completions API.
    pub llm_api_key: String,
    /// Model identifier passed with every completion request.
    pub llm_model: String,
    /// Base URL of the mail-delivery API.
    pub mail_api_url: String,
    /// API key presented to the mail-delivery API.
    pub mail_api_key: String,
    /// Mailbox used as the sender address on outgoing reports.
    pub mail_from_address: String,
    /// Display name used when a send request does not carry one.
    pub mail_from_name: String,
    /// Optional override for the per-chunk token budget.
    pub max_chunk_tokens: Option<usize>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

const DEFAULT_SCRAPE_API_URL: &str = "https://api.firecrawl.dev";
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com";
const DEFAULT_LLM_MODEL: &str = "gpt-4";
const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com";
const DEFAULT_MAIL_FROM_NAME: &str = "Web Audit";

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            scrape_api_url: load_env_or("SCRAPE_API_URL", DEFAULT_SCRAPE_API_URL),
            scrape_api_key: load_env("SCRAPE_API_KEY")?,
            llm_api_url: load_env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
            llm_api_key: load_env("LLM_API_KEY")?,
            llm_model: load_env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            mail_api_url: load_env_or("MAIL_API_URL", DEFAULT_MAIL_API_URL),
            mail_api_key: load_env("MAIL_API_KEY")?,
            mail_from_address: load_env("MAIL_FROM_ADDRESS")?,
            mail_from_name: load_env_or("MAIL_FROM_NAME", DEFAULT_MAIL_FROM_NAME),
            max_chunk_tokens: load_env_optional("MAX_CHUNK_TOKENS")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MAX_CHUNK_TOKENS".to_string()))
                })
                .transpose()?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        scrape_api_url = %config.scrape_api_url,
        llm_api_url = %config.llm_api_url,
        llm_model = %config.llm_model,
        mail_api_url = %config.mail_api_url,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
