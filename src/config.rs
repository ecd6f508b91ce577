use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

pub const DEFAULT_QUERY: &str = "Environmental impact of cryptocurrency mining";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub agent: AgentConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub default_query: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig {
                default_query: DEFAULT_QUERY.to_string(),
            },
            retry: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 1000,
                backoff: 2.0,
            },
            logging: LoggingConfig {
                filter: "research_agent=info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            agent: AgentConfig {
                default_query: lookup("RESEARCH_QUERY")
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or(defaults.agent.default_query),
            },
            retry: RetryConfig {
                max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
                initial_delay_ms: parse_or(&lookup, "RETRY_DELAY_MS", defaults.retry.initial_delay_ms)?,
                backoff: parse_or(&lookup, "RETRY_BACKOFF", defaults.retry.backoff)?,
            },
            logging: LoggingConfig {
                filter: lookup("LOG_FILTER").unwrap_or(defaults.logging.filter),
            },
        };

        // delays must strictly grow and stay representable
        let backoff = config.retry.backoff;
        if !backoff.is_finite() || backoff <= 1.0 {
            anyhow::bail!("RETRY_BACKOFF must be a finite number greater than 1, got {}", backoff);
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("RESEARCH_QUERY", "market potential of solar"),
            ("RETRY_MAX_ATTEMPTS", "5"),
            ("RETRY_DELAY_MS", "10"),
            ("RETRY_BACKOFF", "1.5"),
        ]))
        .unwrap();

        assert_eq!(config.agent.default_query, "market potential of solar");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 10);
        assert_eq!(config.retry.backoff, 1.5);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("RETRY_MAX_ATTEMPTS", "three")])).unwrap_err();
        assert!(err.to_string().contains("RETRY_MAX_ATTEMPTS"));

        assert!(Config::from_lookup(lookup_from(&[("RETRY_BACKOFF", "-1")])).is_err());
    }

    #[test]
    fn test_backoff_must_grow_and_be_finite() {
        for raw in ["inf", "NaN", "0.5", "1.0"] {
            let err = Config::from_lookup(lookup_from(&[("RETRY_BACKOFF", raw)])).unwrap_err();
            assert!(err.to_string().contains("RETRY_BACKOFF"), "accepted {}", raw);
        }

        let config = Config::from_lookup(lookup_from(&[("RETRY_BACKOFF", "1.01")])).unwrap();
        assert_eq!(config.retry.backoff, 1.01);
    }
}
