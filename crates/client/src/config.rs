use std::str::FromStr;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Connection settings for the layout persistence service.
///
/// All fields have defaults suitable for local development against the
/// backend's dev server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the versioned API, without trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request, if set.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                        |
    /// |------------------------|--------------------------------|
    /// | `LAYOUT_API_URL`       | `http://localhost:3000/api/v1` |
    /// | `LAYOUT_API_TOKEN`     | unset                          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                           |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("LAYOUT_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/v1".into())
            .trim_end_matches('/')
            .to_string();

        let token = std::env::var("LAYOUT_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let request_timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", 30, "a valid u64")?;

        Ok(Self {
            api_url,
            token,
            request_timeout_secs,
        })
    }
}

/// Parse `var` from the environment, falling back to `default` when unset.
pub fn env_parse<T: FromStr>(
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a boolean flag (`true/false/1/0/yes/no/on/off`), defaulting when unset.
pub fn env_flag(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Ok(value) => parse_flag(&value).ok_or(ConfigError::Invalid {
            var,
            expected: "a boolean",
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
