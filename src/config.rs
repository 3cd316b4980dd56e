use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::warn;
use url::Url;

const DEFAULT_TAVILY_BASE: &str = "https://api.tavily.com";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// TCP connection establishment timeout. Per-request timeouts are set by each client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error("{name} must use http or https, got '{value}'")]
    InvalidScheme { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Provider endpoints and credentials.
///
/// Environment variables:
/// - `TAVILY_API_KEY`, `OPENAI_API_KEY`: provider credentials (not validated here)
/// - `OPENAI_MODEL`: chat model (default `gpt-4o-mini`)
/// - `TAVILY_BASE_URL`, `OPENAI_BASE_URL`: endpoint overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub tavily_api_key: ApiKey,
    pub tavily_base_url: String,
    pub openai_api_key: ApiKey,
    pub openai_base_url: String,
    pub model: String,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let tavily_api_key = get("TAVILY_API_KEY").unwrap_or_else(|| {
            warn!("TAVILY_API_KEY not set; search requests will be rejected by the provider");
            String::new()
        });
        let openai_api_key = get("OPENAI_API_KEY").unwrap_or_else(|| {
            warn!("OPENAI_API_KEY not set; model requests will be rejected by the provider");
            String::new()
        });

        let tavily_base_url = validate_base_url(
            "TAVILY_BASE_URL",
            get("TAVILY_BASE_URL").as_deref().unwrap_or(DEFAULT_TAVILY_BASE),
        )?;
        let openai_base_url = validate_base_url(
            "OPENAI_BASE_URL",
            get("OPENAI_BASE_URL").as_deref().unwrap_or(DEFAULT_OPENAI_BASE),
        )?;

        Ok(Self {
            tavily_api_key: ApiKey(tavily_api_key),
            tavily_base_url,
            openai_api_key: ApiKey(openai_api_key),
            openai_base_url,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn http_client(&self) -> Result<Client, ConfigError> {
        Ok(Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(crate::USER_AGENT)
            .build()?)
    }
}

fn validate_base_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidScheme {
            name,
            value: value.to_string(),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
