//! # Configuration
//!
//! Service configuration from an optional TOML file plus environment
//! overrides.
//!
//! ```toml
//! [runtime]
//! mode = "production"     # or "development"
//! test_mode = false
//!
//! [cache]
//! path = "habeats-cache.db"
//! capacity_bytes = 5242880
//! key_prefix = "habeats_cache"
//! in_memory = false
//! ```
//!
//! ## Environment Overrides
//!
//! - `HABEATS_MODE`: `development` or `production`
//! - `HABEATS_TEST_FRONTEND`: `true` to enable the test-mode bypass
//!
//! Both are read once, at startup. The resulting [`RuntimeFlags`] are the
//! only way the access bypass can be switched on.

use habeats_core::{
    AccessPolicy, BuildMode, CacheConfig, HabeatsError, RuntimeFlags, StorageBackend, TtlCache,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file for the persistent cache.
pub const DEFAULT_CACHE_PATH: &str = "habeats-cache.db";

/// `[runtime]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    pub mode: BuildMode,
    pub test_mode: bool,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub path: PathBuf,
    pub capacity_bytes: Option<u64>,
    pub key_prefix: Option<String>,
    pub in_memory: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CACHE_PATH),
            capacity_bytes: None,
            key_prefix: None,
            in_memory: false,
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabeatsConfig {
    pub runtime: RuntimeSection,
    pub cache: CacheSection,
}

impl HabeatsConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, HabeatsError> {
        toml::from_str(text).map_err(|e| HabeatsError::ConfigError(e.to_string()))
    }

    /// Load from a file, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, HabeatsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            HabeatsError::ConfigError(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, HabeatsError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HabeatsError> {
        if let Some(mode) = lookup("HABEATS_MODE") {
            self.runtime.mode = mode.parse()?;
        }
        if let Some(flag) = lookup("HABEATS_TEST_FRONTEND") {
            self.runtime.test_mode = parse_flag("HABEATS_TEST_FRONTEND", &flag)?;
        }
        Ok(self)
    }

    /// Runtime flags for the access policy.
    #[must_use]
    pub fn runtime_flags(&self) -> RuntimeFlags {
        RuntimeFlags {
            build_mode: self.runtime.mode,
            test_mode: self.runtime.test_mode,
        }
    }

    /// Build the access policy from these flags.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::from_flags(self.runtime_flags())
    }

    /// Default per-call cache options (prefix only).
    #[must_use]
    pub fn cache_defaults(&self) -> CacheConfig {
        CacheConfig {
            ttl: None,
            key_prefix: self.cache.key_prefix.clone(),
        }
    }

    /// Open the configured store and wrap it in a cache.
    pub fn open_cache(&self) -> Result<TtlCache<StorageBackend>, HabeatsError> {
        let backend = if self.cache.in_memory {
            match self.cache.capacity_bytes {
                Some(capacity) => {
                    StorageBackend::InMemory(habeats_core::MemoryStore::with_capacity(capacity))
                }
                None => StorageBackend::default(),
            }
        } else {
            StorageBackend::open_redb(&self.cache.path, self.cache.capacity_bytes)?
        };
        Ok(TtlCache::new(backend))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, HabeatsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(HabeatsError::ConfigError(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_production() {
        let config = HabeatsConfig::default();
        assert_eq!(config.runtime.mode, BuildMode::Production);
        assert!(!config.runtime.test_mode);
        assert_eq!(config.cache.path, PathBuf::from(DEFAULT_CACHE_PATH));
        assert!(!config.access_policy().bypass_active());
    }

    #[test]
    fn parses_toml_sections() {
        let config = HabeatsConfig::from_toml(
            r#"
            [runtime]
            mode = "development"

            [cache]
            capacity_bytes = 4096
            key_prefix = "habeats_cache"
            in_memory = true
            "#,
        )
        .expect("parse");

        assert_eq!(config.runtime.mode, BuildMode::Development);
        assert_eq!(config.cache.capacity_bytes, Some(4096));
        assert_eq!(config.cache_defaults().key_prefix.as_deref(), Some("habeats_cache"));
        assert!(config.cache.in_memory);
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(
            HabeatsConfig::from_toml("[runtime]\nmode = \"staging\""),
            Err(HabeatsError::ConfigError(_))
        ));
    }

    #[test]
    fn env_overrides_win() {
        let config = HabeatsConfig::default()
            .with_overrides(lookup(&[("HABEATS_TEST_FRONTEND", "true")]))
            .expect("overrides");
        assert!(config.runtime_flags().test_mode);
        assert_eq!(config.runtime_flags().build_mode, BuildMode::Production);

        let config = config
            .with_overrides(lookup(&[("HABEATS_MODE", "development")]))
            .expect("overrides");
        assert_eq!(config.runtime.mode, BuildMode::Development);
    }

    #[test]
    fn invalid_flag_rejected() {
        assert!(
            HabeatsConfig::default()
                .with_overrides(lookup(&[("HABEATS_TEST_FRONTEND", "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn in_memory_cache_opens_without_disk() {
        let mut config = HabeatsConfig::default();
        config.cache.in_memory = true;
        let cache = config.open_cache().expect("open");
        assert!(!cache.store().is_persistent());
    }
}
