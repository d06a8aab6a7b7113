//! Pipeline-level configuration, read from the environment, along with the
//! per-call overrides a sender may supply.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{env, fmt, time::Duration};
use url::Url;

/// The origin Kakao's JavaScript SDK reports when none is configured.
pub const DEFAULT_ORIGIN: &str = "https://open.kakao.com";

static DEFAULT_ORIGIN_URL: Lazy<Url> = Lazy::new(|| Url::parse(DEFAULT_ORIGIN).unwrap());

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A newtype wrapper around a Kakao JavaScript app key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKey(pub String);

#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub api_key: ApiKey,
    /// Reported in the `ka` client descriptor of the picker call.
    pub origin: Url,
    /// The deadline applied to every request.
    pub timeout: Duration,
}

/// Replacements for [KakaoConfig] values, applying to a single send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Overrides {
    pub api_key: Option<ApiKey>,
    /// Only the scheme, host and port are reported in the `ka` descriptor.
    /// Any path or query is dropped.
    pub origin: Option<Url>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(k) => write!(f, "No ${} environment variable found", k),
            ConfigError::Invalid(k, v) => write!(f, "Could not parse ${}: {}", k, v),
        }
    }
}

impl KakaoConfig {
    pub fn new(api_key: ApiKey) -> Self {
        KakaoConfig {
            api_key,
            origin: default_origin(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `$KAKAO_API_KEY`, `$KAKAO_ORIGIN`, and `$KAKAO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = KakaoConfig::new(ApiKey(required("KAKAO_API_KEY")?));

        if let Ok(x) = env::var("KAKAO_ORIGIN") {
            config.origin =
                Url::parse(&x).map_err(|e| ConfigError::Invalid("KAKAO_ORIGIN", e.to_string()))?;
        }

        if let Ok(x) = env::var("KAKAO_TIMEOUT_SECS") {
            config.timeout = x
                .parse()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid("KAKAO_TIMEOUT_SECS", format!("{}", e)))?;
        }

        Ok(config)
    }

    /// The app key and origin for one call, preferring any overrides.
    pub fn resolve<'a>(&'a self, overrides: &'a Overrides) -> (&'a ApiKey, &'a Url) {
        (
            overrides.api_key.as_ref().unwrap_or(&self.api_key),
            overrides.origin.as_ref().unwrap_or(&self.origin),
        )
    }
}

fn default_origin() -> Url {
    DEFAULT_ORIGIN_URL.clone()
}

/// Read an environment variable that must be present and non-empty.
pub fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|x| !x.is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Read an optional boolean environment variable, accepting `true`/`false`
/// and `1`/`0`.
pub fn flag(key: &'static str) -> Result<bool, ConfigError> {
    match env::var(key).ok().as_deref() {
        None | Some("") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(x) => Err(ConfigError::Invalid(key, x.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_origin() {
        assert_eq!(default_origin().as_str(), "https://open.kakao.com/");
    }

    #[test]
    fn test_resolve() {
        let config = KakaoConfig::new(ApiKey("default".into()));

        let none = Overrides::default();
        let (key, origin) = config.resolve(&none);
        assert_eq!(key, &ApiKey("default".into()));
        assert_eq!(origin, &default_origin());

        let overrides = Overrides {
            api_key: Some(ApiKey("other".into())),
            origin: Some(Url::parse("https://example.com").unwrap()),
        };
        let (key, origin) = config.resolve(&overrides);
        assert_eq!(key, &ApiKey("other".into()));
        assert_eq!(origin.as_str(), "https://example.com/");
    }

    // Environment variables are process-wide, so each test below uses its own
    // keys rather than the real ones.

    #[test]
    fn test_required() {
        env::set_var("IRIS_TEST_REQUIRED_SET", "x");
        env::set_var("IRIS_TEST_REQUIRED_EMPTY", "");

        assert_eq!(required("IRIS_TEST_REQUIRED_SET"), Ok("x".to_owned()));
        assert_eq!(
            required("IRIS_TEST_REQUIRED_EMPTY"),
            Err(ConfigError::Missing("IRIS_TEST_REQUIRED_EMPTY"))
        );
        assert_eq!(
            required("IRIS_TEST_REQUIRED_UNSET"),
            Err(ConfigError::Missing("IRIS_TEST_REQUIRED_UNSET"))
        );
    }

    #[test]
    fn test_flag() {
        env::set_var("IRIS_TEST_FLAG_TRUE", "true");
        env::set_var("IRIS_TEST_FLAG_ONE", "1");
        env::set_var("IRIS_TEST_FLAG_ZERO", "0");
        env::set_var("IRIS_TEST_FLAG_BAD", "yes");

        assert_eq!(flag("IRIS_TEST_FLAG_TRUE"), Ok(true));
        assert_eq!(flag("IRIS_TEST_FLAG_ONE"), Ok(true));
        assert_eq!(flag("IRIS_TEST_FLAG_ZERO"), Ok(false));
        assert_eq!(flag("IRIS_TEST_FLAG_UNSET"), Ok(false));
        assert_eq!(
            flag("IRIS_TEST_FLAG_BAD"),
            Err(ConfigError::Invalid("IRIS_TEST_FLAG_BAD", "yes".into()))
        );
    }
}
