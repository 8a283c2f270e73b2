use std::{env, time::Duration};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

// Seconds before an API request is abandoned
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
// Volunteers requested per page when listing applicants
const DEFAULT_APPLICANT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),
    #[error("environment variable `{name}` has invalid value `{value}`: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug)]
pub struct RemoteConfig {
    api_base: Url,
    token: Option<SecretString>,
    timeout: Duration,
    applicant_page_limit: u32,
}

impl RemoteConfig {
    pub fn new(api_base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: parse_base(api_base)?,
            token: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            applicant_page_limit: DEFAULT_APPLICANT_PAGE_LIMIT,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("NAB_API_BASE").ok_or(ConfigError::MissingVar("NAB_API_BASE"))?;
        let mut config = Self::new(&api_base)?;

        if let Some(token) = lookup("NAB_API_TOKEN").filter(|token| !token.is_empty()) {
            config = config.with_token(token);
        }
        if let Some(raw) = lookup("NAB_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("NAB_HTTP_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("NAB_APPLICANT_PAGE_LIMIT") {
            config.applicant_page_limit =
                parse_number::<u32>("NAB_APPLICANT_PAGE_LIMIT", &raw)?.max(1);
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_applicant_page_limit(mut self, limit: u32) -> Self {
        self.applicant_page_limit = limit.max(1);
        self
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn applicant_page_limit(&self) -> u32 {
        self.applicant_page_limit
    }

    /// Resolves `path` (no leading slash) against the API base.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.api_base.join(path)
    }
}

fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).map_err(|err| ConfigError::InvalidVar {
        name: "NAB_API_BASE",
        value: raw.to_string(),
        reason: err.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidVar {
            name: "NAB_API_BASE",
            value: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::InvalidVar {
        name,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}
