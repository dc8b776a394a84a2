//! Harness Configuration
//!
//! Simulated costs and log retention. Defaults reproduce the classic demo:
//! the expensive tab renders 2000 posts at 1 ms each, the deferred value
//! takes 250 ms to recompute, and timeouts and worker replies fire on the
//! next cycle.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`CADENCE_MAX_LOG_ENTRIES`, `CADENCE_EXPENSIVE_TAB_MS`,
//!    `CADENCE_RECOMPUTE_MS`)
//! 3. `config:` block of the scenario file
//! 4. Defaults

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result};
use crate::event::LogConfig;
use crate::harness::Tab;

/// Posts rendered by the expensive tab
pub const EXPENSIVE_TAB_POSTS: u64 = 2000;
/// Simulated render cost per post (ms)
pub const POST_RENDER_MS: u64 = 1;
/// Simulated deferred-value recomputation (ms)
pub const DEFAULT_RECOMPUTE_MS: u64 = 250;

/// Main configuration structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Log retention
    pub log: LogConfig,

    /// Render cost of the expensive tab (ms)
    pub expensive_tab_ms: u64,

    /// Render cost of the cheap tabs (ms)
    pub cheap_tab_ms: u64,

    /// Deferred-value recomputation cost (ms)
    pub recompute_ms: u64,

    /// Delay used by the timeout strategy (ms)
    pub timeout_delay_ms: u64,

    /// Time before the background worker replies (ms)
    pub worker_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            expensive_tab_ms: EXPENSIVE_TAB_POSTS * POST_RENDER_MS,
            cheap_tab_ms: 0,
            recompute_ms: DEFAULT_RECOMPUTE_MS,
            timeout_delay_ms: 0,
            worker_ms: 0,
        }
    }
}

impl HarnessConfig {
    /// Merge with environment variables
    ///
    /// Environment variables take precedence over file values.
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Merge with an arbitrary variable lookup (testable form of `with_env`)
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(max) = read_u64(&lookup, "CADENCE_MAX_LOG_ENTRIES")? {
            self.log.max_entries = Some(max as usize);
        }
        if let Some(ms) = read_u64(&lookup, "CADENCE_EXPENSIVE_TAB_MS")? {
            self.expensive_tab_ms = ms;
        }
        if let Some(ms) = read_u64(&lookup, "CADENCE_RECOMPUTE_MS")? {
            self.recompute_ms = ms;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make the harness useless
    pub fn validate(&self) -> Result<()> {
        if self.log.max_entries == Some(0) {
            return Err(CadenceError::ConfigError {
                reason: "max_entries must be at least 1 (omit it for an unbounded log)".to_string(),
            });
        }
        Ok(())
    }

    /// Simulated render cost of switching to `tab`
    pub fn render_cost(&self, tab: Tab) -> Duration {
        if tab.is_expensive() {
            Duration::from_millis(self.expensive_tab_ms)
        } else {
            Duration::from_millis(self.cheap_tab_ms)
        }
    }

    pub fn recompute_cost(&self) -> Duration {
        Duration::from_millis(self.recompute_ms)
    }

    pub fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_delay_ms)
    }

    pub fn worker_latency(&self) -> Duration {
        Duration::from_millis(self.worker_ms)
    }
}

fn read_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u64>> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CadenceError::ConfigError {
                reason: format!("{}='{}' is not a non-negative integer: {}", name, raw, e),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_classic_demo() {
        let config = HarnessConfig::default();
        assert_eq!(config.render_cost(Tab::Two), Duration::from_millis(2000));
        assert_eq!(config.render_cost(Tab::One), Duration::ZERO);
        assert_eq!(config.recompute_cost(), Duration::from_millis(250));
        assert_eq!(config.timeout_delay(), Duration::ZERO);
        assert_eq!(config.log.max_entries, None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: HarnessConfig = serde_yaml::from_str("expensive_tab_ms: 50\n").unwrap();
        assert_eq!(config.expensive_tab_ms, 50);
        assert_eq!(config.recompute_ms, DEFAULT_RECOMPUTE_MS);
    }

    #[test]
    fn nested_log_config_parses() {
        let config: HarnessConfig = serde_yaml::from_str("log:\n  max_entries: 8\n").unwrap();
        assert_eq!(config.log.max_entries, Some(8));
    }

    #[test]
    fn env_overrides_file_values() {
        let config = HarnessConfig::default()
            .with_vars(vars(&[
                ("CADENCE_MAX_LOG_ENTRIES", "5"),
                ("CADENCE_RECOMPUTE_MS", "40"),
            ]))
            .unwrap();
        assert_eq!(config.log.max_entries, Some(5));
        assert_eq!(config.recompute_ms, 40);
        assert_eq!(config.expensive_tab_ms, 2000);
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let config = HarnessConfig::default()
            .with_vars(vars(&[("CADENCE_EXPENSIVE_TAB_MS", "  ")]))
            .unwrap();
        assert_eq!(config.expensive_tab_ms, 2000);
    }

    #[test]
    fn zero_max_entries_is_rejected() {
        let err = HarnessConfig::default()
            .with_vars(vars(&[("CADENCE_MAX_LOG_ENTRIES", "0")]))
            .unwrap_err();
        assert!(matches!(err, CadenceError::ConfigError { .. }));
        assert!(err.to_string().contains("max_entries"));

        let mut config = HarnessConfig::default();
        config.log = LogConfig::bounded(0);
        assert!(config.validate().is_err());
        assert!(HarnessConfig::default().validate().is_ok());
    }

    #[test]
    fn malformed_env_value_is_a_config_error() {
        let err = HarnessConfig::default()
            .with_vars(vars(&[("CADENCE_EXPENSIVE_TAB_MS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, CadenceError::ConfigError { .. }));
        assert!(err.to_string().contains("CADENCE_EXPENSIVE_TAB_MS"));
    }
}
