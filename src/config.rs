use anyhow::anyhow;
use tracing::info;

use crate::{bracket::Seeding, AppError};

/// Size and lifespan of the client-side caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of tournaments kept per cache.
    pub size: usize,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            size: 64,
            ttl_secs: 60,
        }
    }
}

/// Settings for talking to the tournament backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub cache: CacheSettings,
    /// Fixed seed for participant order. Brackets are shuffled randomly without one.
    pub bracket_seed: Option<u64>,
}

impl Config {
    /// Loads the configuration from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        // Load the .env file only in the development environment (bypassed with the --release flag)
        #[cfg(debug_assertions)]
        dotenv::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!("Successfully loaded configuration for {}", config.api_url);
        Ok(config)
    }

    /// Builds the configuration from any key-value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BRACKET_API_URL")
            .ok_or(anyhow!("Expected BRACKET_API_URL as an environment variable"))?;
        let api_token = lookup("BRACKET_API_TOKEN").filter(|token| !token.is_empty());

        let defaults = CacheSettings::default();
        let size = parse(&lookup, "BRACKET_CACHE_SIZE")?.unwrap_or(defaults.size);
        if size == 0 {
            return Err(anyhow!("BRACKET_CACHE_SIZE must be at least 1"));
        }
        let ttl_secs = parse(&lookup, "BRACKET_CACHE_TTL_SECS")?.unwrap_or(defaults.ttl_secs);
        let bracket_seed = parse(&lookup, "BRACKET_SEED")?;

        Ok(Self {
            api_url,
            api_token,
            cache: CacheSettings { size, ttl_secs },
            bracket_seed,
        })
    }

    pub fn seeding(&self) -> Seeding {
        match self.bracket_seed {
            Some(seed) => Seeding::Seeded(seed),
            None => Seeding::Random,
        }
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Invalid value {:?} for {}: {}", raw, key, e))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("BRACKET_API_URL", "http://localhost:8080/api")]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.api_token, None);
        assert_eq!(config.cache, CacheSettings::default());
        assert_eq!(config.seeding(), Seeding::Random);
    }

    #[test]
    fn reads_every_setting() {
        let config = config(&[
            ("BRACKET_API_URL", "https://api.example.gg"),
            ("BRACKET_API_TOKEN", "secret"),
            ("BRACKET_CACHE_SIZE", "8"),
            ("BRACKET_CACHE_TTL_SECS", " 5 "),
            ("BRACKET_SEED", "1234"),
        ])
        .unwrap();

        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(
            config.cache,
            CacheSettings {
                size: 8,
                ttl_secs: 5
            }
        );
        assert_eq!(config.seeding(), Seeding::Seeded(1234));
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = config(&[
            ("BRACKET_API_URL", "http://localhost"),
            ("BRACKET_SEED", "soon"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("BRACKET_SEED"));

        assert!(config(&[
            ("BRACKET_API_URL", "http://localhost"),
            ("BRACKET_CACHE_SIZE", "0"),
        ])
        .is_err());
    }
}
