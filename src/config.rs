//! Runtime configuration.
//!
//! Everything the screens share (where the API lives, how long to wait for
//! it, and the specialty catalog) is read once at startup, validated, and
//! handed to every list and form as an `Arc<AppConfig>`.

use crate::models::{Specialty, SPECIALTIES};
use reqwest::Url;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILE: &str = "clinic-admin.log";

const API_URL_VAR: &str = "CLINIC_API_URL";
const TIMEOUT_VAR: &str = "CLINIC_API_TIMEOUT_SECS";
const LOG_FILE_VAR: &str = "CLINIC_LOG_FILE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CLINIC_API_URL '{url}' is not usable: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("CLINIC_API_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),

    #[error("The specialty catalog is empty")]
    EmptyCatalog,

    #[error("Specialty id {0} appears more than once in the catalog")]
    DuplicateSpecialty(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub log_file: PathBuf,
    pub specialties: &'static [Specialty],
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds and validates a configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let log_file = lookup(LOG_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let config = Self {
            api: ApiConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_secs,
            },
            log_file,
            specialties: SPECIALTIES,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.api.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.api.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.api.base_url.clone(),
                reason: "missing host".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }

        if self.specialties.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for specialty in self.specialties {
            if !seen.insert(specialty.id) {
                return Err(ConfigError::DuplicateSpecialty(specialty.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: 1,
            },
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            specialties: SPECIALTIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(config.specialties.len(), 6);
    }

    #[test]
    fn base_url_override_is_trimmed() {
        let config = config_from(&[(API_URL_VAR, " https://api.clinic.test/ ")]).unwrap();
        assert_eq!(config.api.base_url, "https://api.clinic.test");
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            config_from(&[(API_URL_VAR, "localhost:5000")]),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            config_from(&[(API_URL_VAR, "ftp://files.clinic.test")]),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert_eq!(
            config_from(&[(TIMEOUT_VAR, "soon")]).unwrap_err(),
            ConfigError::InvalidTimeout("soon".to_string())
        );
        assert!(config_from(&[(TIMEOUT_VAR, "0")]).is_err());
        assert_eq!(
            config_from(&[(TIMEOUT_VAR, "30")]).unwrap().api.timeout_secs,
            30
        );
    }

    #[test]
    fn catalog_must_be_unique_and_non_empty() {
        const DUPLICATED: &[Specialty] = &[
            Specialty { id: 7, name: "Cardiology" },
            Specialty { id: 7, name: "Heart" },
        ];
        let mut config = AppConfig::for_tests();
        config.specialties = DUPLICATED;
        assert_eq!(config.validate(), Err(ConfigError::DuplicateSpecialty(7)));
        config.specialties = &[];
        assert_eq!(config.validate(), Err(ConfigError::EmptyCatalog));
    }
}
