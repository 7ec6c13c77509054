//! Runtime configuration loaded from the process environment.
//!
//! The extension is loaded by the Dart VM, so there is no command line to read
//! from. Everything tunable comes from `DART_BRIDGE_*` variables.

use std::env;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "dart_bridge=info";

/// Default number of worker threads driving async tasks.
pub const DEFAULT_WORKERS: usize = 2;

/// Snapshot of configuration values consumed by the bridge.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeCfg {
    pub log_filter: String,
    pub log_json: bool,
    pub workers: usize,
}

impl Default for BridgeCfg {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl BridgeCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup. Unparsable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_filter = lookup("DART_BRIDGE_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_filter);
        let log_json = lookup("DART_BRIDGE_LOG_JSON")
            .map(|value| parse_flag(&value))
            .unwrap_or(defaults.log_json);
        let workers = lookup("DART_BRIDGE_WORKERS")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(defaults.workers)
            .max(1);

        Self {
            log_filter,
            log_json,
            workers,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg_from(pairs: &[(&str, &str)]) -> BridgeCfg {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BridgeCfg::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(cfg_from(&[]), BridgeCfg::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = cfg_from(&[
            ("DART_BRIDGE_LOG", "dart_bridge=trace"),
            ("DART_BRIDGE_LOG_JSON", "TRUE"),
            ("DART_BRIDGE_WORKERS", "6"),
        ]);
        assert_eq!(cfg.log_filter, "dart_bridge=trace");
        assert!(cfg.log_json);
        assert_eq!(cfg.workers, 6);
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert_eq!(cfg_from(&[("DART_BRIDGE_WORKERS", "0")]).workers, 1);
        assert_eq!(
            cfg_from(&[("DART_BRIDGE_WORKERS", "lots")]).workers,
            DEFAULT_WORKERS
        );
    }

    #[test]
    fn blank_filter_falls_back() {
        let cfg = cfg_from(&[("DART_BRIDGE_LOG", "  ")]);
        assert_eq!(cfg.log_filter, DEFAULT_LOG_FILTER);
    }
}
