// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express,
//! such as non-zero windows, a usable cache URL, and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::{CacheBackend, PitwallConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// every collected validation error (does not fail fast).
pub fn validate_config(config: &PitwallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.cache.operation_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "cache.operation_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.cache.backend == CacheBackend::Redis {
        let url = config.cache.url.trim();
        if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "cache.url `{url}` must start with redis:// or rediss:// when backend = \"redis\""
                ),
            });
        }
    }

    if config.rate_limit.default_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.default_limit must be at least 1".to_string(),
        });
    }

    if config.rate_limit.default_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.default_window_secs must be at least 1".to_string(),
        });
    }

    if config.memory.retention_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.retention_secs must be at least 1".to_string(),
        });
    }

    if config.memory.embedding_dimensions == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.embedding_dimensions must be at least 1".to_string(),
        });
    }

    if config.memory.apology.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "memory.apology must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(validate_config(&PitwallConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = PitwallConfig::default();
        config.cache.operation_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("operation_timeout_ms"));
    }

    #[test]
    fn redis_backend_requires_redis_url() {
        let mut config = PitwallConfig::default();
        config.cache.backend = CacheBackend::Redis;
        config.cache.url = "http://localhost:6379".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("redis://"));

        config.cache.url = "rediss://cache.internal:6380/1".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn memory_backend_ignores_url() {
        let mut config = PitwallConfig::default();
        config.cache.url = "not a url".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = PitwallConfig::default();
        config.storage.database_path = "  ".to_string();
        config.rate_limit.default_limit = 0;
        config.rate_limit.default_window_secs = 0;
        config.memory.retention_secs = 0;
        config.memory.embedding_dimensions = 0;
        config.memory.apology = String::new();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
    }
}
