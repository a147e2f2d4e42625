//! Process-wide upstream configuration.
//!
//! [`ApiConfig`] is assembled once at startup from, in order of precedence,
//! explicit overrides (command-line flags), the `NCBI_*` environment variables
//! and built-in defaults. It is read-only afterwards.

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.ncbi.nlm.nih.gov/datasets/v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const BASE_URL_ENV: &str = "NCBI_BASE_URL";
pub const API_KEY_ENV: &str = "NCBI_API_KEY";
pub const TIMEOUT_ENV: &str = "NCBI_TIMEOUT";

/// Hostnames (and their subdomains) accepted for non-local base addresses.
const ALLOWED_NCBI_DOMAINS: &[&str] = &["ncbi.nlm.nih.gov"];
/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("base URL '{0}' must include a host")]
    MissingHost(String),
    #[error("base URL must use https for non-localhost hosts; got '{0}://'")]
    InsecureScheme(String),
    #[error("base URL host '{host}' is not allowed; must be {allowed:?} or a subdomain, or localhost")]
    HostNotAllowed { host: String, allowed: &'static [&'static str] },
    #[error("invalid timeout '{0}': expected a positive number of milliseconds")]
    InvalidTimeout(String),
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Values supplied on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Immutable upstream configuration shared by every invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration against `base_url` with no credential and the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: default_user_agent(),
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(timeout_ms.to_string()));
        }
        self.timeout = Duration::from_millis(timeout_ms);
        Ok(self)
    }

    /// Resolve the configuration from overrides, the environment and defaults.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| non_empty_env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_ms = match overrides.timeout_ms {
            Some(timeout_ms) => timeout_ms,
            None => match non_empty_env(TIMEOUT_ENV) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidTimeout(raw))?,
                None => DEFAULT_TIMEOUT_MS,
            },
        };

        Self::new(&base_url)?
            .with_api_key(non_empty_env(API_KEY_ENV))
            .with_timeout_ms(timeout_ms)
    }

    pub fn timeout_ms(&self) -> u128 {
        self.timeout.as_millis()
    }
}

pub fn default_user_agent() -> String {
    format!("ncbi-datasets-mcp/{}", env!("CARGO_PKG_VERSION"))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Validate a base URL and strip any trailing `/`.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS, and the host must be `ncbi.nlm.nih.gov`
///   or a subdomain of it
fn normalize_base_url(base: &str) -> Result<String, ConfigError> {
    let trimmed = base.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|error| ConfigError::InvalidBaseUrl {
        value: base.to_string(),
        reason: error.to_string(),
    })?;

    let host_name = parsed.host_str().ok_or_else(|| ConfigError::MissingHost(base.to_string()))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(trimmed.to_string());
    }

    if parsed.scheme() != "https" {
        return Err(ConfigError::InsecureScheme(parsed.scheme().to_string()));
    }

    let is_allowed_domain = ALLOWED_NCBI_DOMAINS.iter().any(|&allowed_domain| {
        host_name.eq_ignore_ascii_case(allowed_domain) || host_name.to_ascii_lowercase().ends_with(&format!(".{}", allowed_domain))
    });
    if !is_allowed_domain {
        return Err(ConfigError::HostNotAllowed {
            host: host_name.to_string(),
            allowed: ALLOWED_NCBI_DOMAINS,
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let mut all = vec![(BASE_URL_ENV, None), (API_KEY_ENV, None), (TIMEOUT_ENV, None)];
        for (name, value) in vars {
            all.retain(|(existing, _)| existing != name);
            all.push((*name, *value));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    fn defaults_apply_without_environment() {
        clean_env(&[], || {
            let config = ApiConfig::resolve(&ConfigOverrides::default()).expect("config");
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.api_key, None);
            assert_eq!(config.timeout, Duration::from_millis(30_000));
            assert!(config.user_agent.starts_with("ncbi-datasets-mcp/"));
        });
    }

    #[test]
    fn environment_supplies_key_base_and_timeout() {
        clean_env(
            &[
                (BASE_URL_ENV, Some("https://eutils.ncbi.nlm.nih.gov/datasets/v2/")),
                (API_KEY_ENV, Some("secret-key")),
                (TIMEOUT_ENV, Some("1500")),
            ],
            || {
                let config = ApiConfig::resolve(&ConfigOverrides::default()).expect("config");
                assert_eq!(config.base_url, "https://eutils.ncbi.nlm.nih.gov/datasets/v2");
                assert_eq!(config.api_key.as_deref(), Some("secret-key"));
                assert_eq!(config.timeout_ms(), 1500);
            },
        );
    }

    #[test]
    fn overrides_win_over_environment() {
        clean_env(&[(BASE_URL_ENV, Some("https://api.ncbi.nlm.nih.gov/other")), (TIMEOUT_ENV, Some("1500"))], || {
            let overrides = ConfigOverrides {
                base_url: Some("http://localhost:8080/v2".into()),
                timeout_ms: Some(250),
            };
            let config = ApiConfig::resolve(&overrides).expect("config");
            assert_eq!(config.base_url, "http://localhost:8080/v2");
            assert_eq!(config.timeout_ms(), 250);
        });
    }

    #[test]
    fn blank_api_key_is_ignored() {
        clean_env(&[(API_KEY_ENV, Some("   "))], || {
            let config = ApiConfig::resolve(&ConfigOverrides::default()).expect("config");
            assert!(config.api_key.is_none());
        });
    }

    #[test]
    fn non_numeric_or_zero_timeout_is_rejected() {
        clean_env(&[(TIMEOUT_ENV, Some("soon"))], || {
            let error = ApiConfig::resolve(&ConfigOverrides::default()).unwrap_err();
            assert_eq!(error, ConfigError::InvalidTimeout("soon".into()));
        });
        clean_env(&[(TIMEOUT_ENV, Some("0"))], || {
            assert!(ApiConfig::resolve(&ConfigOverrides::default()).is_err());
        });
    }

    #[test]
    fn base_url_rules() {
        assert!(ApiConfig::new("http://127.0.0.1:9000").is_ok());
        assert!(ApiConfig::new("https://api.ncbi.nlm.nih.gov/datasets/v2").is_ok());
        assert_eq!(
            ApiConfig::new("http://api.ncbi.nlm.nih.gov/datasets/v2").unwrap_err(),
            ConfigError::InsecureScheme("http".into())
        );
        assert!(matches!(
            ApiConfig::new("https://evil-ncbi.nlm.nih.gov.example.com").unwrap_err(),
            ConfigError::HostNotAllowed { .. }
        ));
        assert!(matches!(ApiConfig::new("not a url").unwrap_err(), ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn debug_output_hides_the_credential() {
        let config = ApiConfig::new(DEFAULT_BASE_URL).expect("config").with_api_key(Some("secret-key".into()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
