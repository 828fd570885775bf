use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default chat model used for both summaries and answers.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the study assistant.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the completions endpoint; absent means every LLM call fails fast.
    pub openai_api_key: Option<String>,
    /// API root, without the `/chat/completions` suffix.
    pub openai_base_url: String,
    /// Model identifier sent with every completion request.
    pub openai_model: String,
    /// Output-token budget for summary requests.
    pub summary_max_tokens: u32,
    /// Output-token budget for question answering.
    pub answer_max_tokens: u32,
    /// Per-request timeout for outbound LLM calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Attempts allowed for a single summarization.
    pub summary_max_attempts: usize,
    /// Character cap applied to normalized document text.
    pub content_max_chars: usize,
    /// Normalized documents shorter than this are not sent to the model.
    pub min_summary_chars: usize,
    /// Upper bound for an uploaded file, in bytes.
    pub max_upload_bytes: usize,
    /// Root directory for uploaded files and the material database.
    pub storage_dir: PathBuf,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Origins allowed by the CORS layer; empty disables CORS.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            summary_max_tokens: 1000,
            answer_max_tokens: 300,
            llm_timeout_secs: 30,
            summary_max_attempts: 2,
            content_max_chars: 4000,
            min_summary_chars: 30,
            max_upload_bytes: 5 * 1024 * 1024,
            storage_dir: PathBuf::from("storage"),
            server_port: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            openai_api_key: load_env_optional("OPENAI_API_KEY"),
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or(defaults.openai_base_url),
            openai_model: load_env_optional("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            summary_max_tokens: parse_env("SUMMARY_MAX_TOKENS")?
                .unwrap_or(defaults.summary_max_tokens),
            answer_max_tokens: parse_env("ANSWER_MAX_TOKENS")?
                .unwrap_or(defaults.answer_max_tokens),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS")?.unwrap_or(defaults.llm_timeout_secs),
            summary_max_attempts: parse_env("SUMMARY_MAX_ATTEMPTS")?
                .unwrap_or(defaults.summary_max_attempts),
            content_max_chars: parse_env("CONTENT_MAX_CHARS")?
                .unwrap_or(defaults.content_max_chars),
            min_summary_chars: parse_env("MIN_SUMMARY_CHARS")?
                .unwrap_or(defaults.min_summary_chars),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
            storage_dir: load_env_optional("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            server_port: parse_env("SERVER_PORT")?,
            cors_allowed_origins: load_env_optional("CORS_ALLOWED_ORIGINS")
                .map(|value| split_list(&value))
                .unwrap_or_default(),
        })
    }

    /// Whether an API credential is available for outbound LLM calls.
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
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
        base_url = %config.openai_base_url,
        model = %config.openai_model,
        has_api_key = config.has_api_key(),
        storage_dir = %config.storage_dir.display(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
