use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

const PRODUCTION_URL: &str = "https://api.jewelmusic.art";
const SANDBOX_URL: &str = "https://api-sandbox.jewelmusic.art";
const KEY_PREFIXES: [&str; 3] = ["jml_live_", "jml_test_", "jml_dev_"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_URL,
            Environment::Sandbox => SANDBOX_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            other => Err(Error::Configuration(format!("unknown environment: {other}"))),
        }
    }
}

/// SDK client settings.
///
/// The API key is held as a [`SecretString`] and never shows up in `Debug`.
#[derive(Debug)]
pub struct ClientConfig {
    api_key: SecretString,
    pub environment: Environment,
    pub base_url: Option<String>,
    pub api_version: String,
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry.
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Configuration("API key is required".into()));
        }
        if !KEY_PREFIXES.iter().any(|p| api_key.starts_with(p)) {
            return Err(Error::Configuration("invalid API key format".into()));
        }

        Ok(Self {
            api_key: api_key.into(),
            environment: Environment::default(),
            base_url: None,
            api_version: "v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            user_agent: format!("jewelmusic-rust-sdk/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Read `JEWELMUSIC_API_KEY`, `JEWELMUSIC_ENVIRONMENT` and `JEWELMUSIC_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("JEWELMUSIC_API_KEY")
            .map_err(|_| Error::Configuration("JEWELMUSIC_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key)?;
        if let Ok(environment) = env::var("JEWELMUSIC_ENVIRONMENT") {
            config.environment = environment.parse()?;
        }
        if let Ok(url) = env::var("JEWELMUSIC_BASE_URL") {
            if !url.is_empty() {
                config.base_url = Some(url);
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Override the API host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_key_prefixes() {
        for key in ["jml_live_abc", "jml_test_abc", "jml_dev_abc"] {
            assert!(ClientConfig::new(key).is_ok(), "{key} rejected");
        }
    }

    #[test]
    fn rejects_empty_and_foreign_keys() {
        assert!(matches!(ClientConfig::new(""), Err(Error::Configuration(_))));
        assert!(matches!(ClientConfig::new("sk_live_abc"), Err(Error::Configuration(_))));
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("jml_test_key").unwrap();
        assert_eq!(config.resolved_base_url(), "https://api.jewelmusic.art");
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert!(config.user_agent.starts_with("jewelmusic-rust-sdk/"));
    }

    #[test]
    fn base_url_resolution() {
        let sandbox = ClientConfig::new("jml_test_key")
            .unwrap()
            .with_environment(Environment::Sandbox);
        assert_eq!(sandbox.resolved_base_url(), "https://api-sandbox.jewelmusic.art");

        let custom = sandbox.with_base_url("http://127.0.0.1:9000/");
        assert_eq!(custom.resolved_base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = ClientConfig::new("jml_live_supersecret").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
    }

    #[test]
    fn parses_environment_names() {
        assert_eq!("Sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
    }
}
