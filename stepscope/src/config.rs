//! Configuration for resource resolution.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable holding the maximum resource size in bytes.
pub const MAX_RESOURCE_BYTES_ENV: &str = "STEPSCOPE_MAX_RESOURCE_BYTES";

/// Environment variable controlling whether symlinks inside the root are followed.
pub const FOLLOW_SYMLINKS_ENV: &str = "STEPSCOPE_FOLLOW_SYMLINKS";

/// Configuration for a [`crate::resources::ResourceResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum resource size in bytes. `None` means unlimited.
    #[serde(default)]
    pub max_resource_bytes: Option<u64>,
    /// Whether symlinks that stay inside the root are followed.
    ///
    /// Links that leave the root are always rejected.
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

fn default_follow_symlinks() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_resource_bytes: None,
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_RESOURCE_BYTES_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(limit) => config.max_resource_bytes = Some(limit),
                Err(err) => warn!(
                    variable = MAX_RESOURCE_BYTES_ENV,
                    value = %raw,
                    error = %err,
                    "Ignoring unparsable resource size limit"
                ),
            }
        }

        if let Some(raw) = lookup(FOLLOW_SYMLINKS_ENV) {
            match parse_bool(&raw) {
                Some(follow) => config.follow_symlinks = follow,
                None => warn!(
                    variable = FOLLOW_SYMLINKS_ENV,
                    value = %raw,
                    "Ignoring unparsable symlink setting"
                ),
            }
        }

        config
    }

    /// Sets the maximum resource size.
    #[must_use]
    pub const fn with_max_resource_bytes(mut self, limit: u64) -> Self {
        self.max_resource_bytes = Some(limit);
        self
    }

    /// Sets whether symlinks inside the root are followed.
    #[must_use]
    pub const fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_resource_bytes, None);
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_from_lookup() {
        let config = ResolverConfig::from_lookup(lookup_from(&[
            (MAX_RESOURCE_BYTES_ENV, "1024"),
            (FOLLOW_SYMLINKS_ENV, "off"),
        ]));

        assert_eq!(config.max_resource_bytes, Some(1024));
        assert!(!config.follow_symlinks);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = ResolverConfig::from_lookup(lookup_from(&[
            (MAX_RESOURCE_BYTES_ENV, "lots"),
            (FOLLOW_SYMLINKS_ENV, "maybe"),
        ]));

        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"max_resource_bytes": 10}"#).unwrap();

        assert_eq!(config.max_resource_bytes, Some(10));
        assert!(config.follow_symlinks);
    }

    #[test]
    fn test_builder_methods() {
        let config = ResolverConfig::new()
            .with_max_resource_bytes(5)
            .with_follow_symlinks(false);

        assert_eq!(config.max_resource_bytes, Some(5));
        assert!(!config.follow_symlinks);
    }
}
