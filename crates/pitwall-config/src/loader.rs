// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pitwall.toml` > `~/.config/pitwall/pitwall.toml` > `/etc/pitwall/pitwall.toml`
//! with environment variable overrides via `PITWALL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PitwallConfig;

/// Top-level sections, longest first so `rate_limit_` wins over any shorter prefix.
const SECTIONS: &[&str] = &["rate_limit", "service", "storage", "memory", "cache"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pitwall/pitwall.toml` (system-wide)
/// 3. `~/.config/pitwall/pitwall.toml` (user XDG config)
/// 4. `./pitwall.toml` (local directory)
/// 5. `PITWALL_*` environment variables
pub fn load_config() -> Result<PitwallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PitwallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitwallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PitwallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PitwallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PitwallConfig::default()))
        .merge(Toml::file("/etc/pitwall/pitwall.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("pitwall/pitwall.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("pitwall.toml"))
        .merge(env_provider())
}

/// Maps a lowercased, prefix-stripped env key onto its `section.key` path.
///
/// `rate_limit_fail_open` -> `rate_limit.fail_open`,
/// `cache_operation_timeout_ms` -> `cache.operation_timeout_ms`.
/// Keys that match no section are passed through unchanged.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because both section
/// names and keys contain underscores.
fn env_provider() -> Env {
    Env::prefixed("PITWALL_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("rate_limit_fail_open"), "rate_limit.fail_open");
        assert_eq!(
            map_env_key("cache_operation_timeout_ms"),
            "cache.operation_timeout_ms"
        );
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
        assert_eq!(
            map_env_key("memory_embedding_dimensions"),
            "memory.embedding_dimensions"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }
}
