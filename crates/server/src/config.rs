use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Session token settings.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens. At least 32 bytes.
    pub secret: String,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    /// Mark the session cookie `Secure`. Disable only for local HTTP setups.
    #[serde(default = "default_true")]
    pub secure_cookie: bool,
}

/// Generative-AI assistant settings. Without an API key the chat endpoint
/// answers with an error reply.
#[derive(Clone, Debug, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub session: SessionConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_ttl_hours() -> i64 {
    24
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl AppConfig {
    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.len() < 32 {
            return Err(ConfigError::Validation(
                "session.secret must be at least 32 characters".into(),
            ));
        }
        if self.session.ttl_hours <= 0 {
            return Err(ConfigError::Validation(
                "session.ttl_hours must be > 0".into(),
            ));
        }
        if self.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "bind_address '{}' is not a socket address",
                self.bind_address
            )));
        }
        if self.assistant.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "assistant.timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `SESSION__SECRET`, `ASSISTANT__API_KEY`) overrides the
/// file value. A `.env` file in the working directory is read first.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from("config.yaml")
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};

    dotenvy::dotenv().ok();

    let cfg = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
