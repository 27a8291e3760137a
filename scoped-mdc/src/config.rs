//! Configuration for scoped diagnostic context.

use crate::errors::{MdcError, MdcResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Default key under which timed scopes publish elapsed milliseconds.
pub const DEFAULT_TIMING_KEY: &str = "operationTimeMs";

/// Environment variable overriding the timing key.
pub const ENV_TIMING_KEY: &str = "SCOPED_MDC_TIMING_KEY";
/// Environment variable overriding the unbalanced pop policy.
pub const ENV_ON_UNBALANCED_POP: &str = "SCOPED_MDC_ON_UNBALANCED_POP";
/// Environment variable enabling transition logging.
pub const ENV_LOG_TRANSITIONS: &str = "SCOPED_MDC_LOG_TRANSITIONS";

/// What to do when a key is popped with an empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnbalancedPopPolicy {
    /// Log the violation and panic, unless the thread is already unwinding.
    #[default]
    Panic,
    /// Log the violation and continue.
    Log,
}

impl FromStr for UnbalancedPopPolicy {
    type Err = MdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(Self::Panic),
            "log" => Ok(Self::Log),
            other => Err(MdcError::InvalidConfig(format!(
                "unknown unbalanced pop policy '{other}', expected 'panic' or 'log'"
            ))),
        }
    }
}

/// Configuration for a scoped context manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Key used by timed scopes for the elapsed milliseconds.
    #[serde(default = "default_timing_key")]
    pub timing_key: String,
    /// Reaction to a pop on an empty stack.
    #[serde(default)]
    pub on_unbalanced_pop: UnbalancedPopPolicy,
    /// Whether every push and pop is logged at trace level.
    #[serde(default)]
    pub log_transitions: bool,
}

fn default_timing_key() -> String {
    DEFAULT_TIMING_KEY.to_string()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            timing_key: default_timing_key(),
            on_unbalanced_pop: UnbalancedPopPolicy::default(),
            log_transitions: false,
        }
    }
}

impl ContextConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timing key.
    #[must_use]
    pub fn with_timing_key(mut self, key: impl Into<String>) -> Self {
        self.timing_key = key.into();
        self
    }

    /// Sets the unbalanced pop policy.
    #[must_use]
    pub const fn with_unbalanced_pop_policy(mut self, policy: UnbalancedPopPolicy) -> Self {
        self.on_unbalanced_pop = policy;
        self
    }

    /// Enables or disables transition logging.
    #[must_use]
    pub const fn with_log_transitions(mut self, enabled: bool) -> Self {
        self.log_transitions = enabled;
        self
    }

    /// Checks the configuration for values that would break scoping.
    pub fn validate(&self) -> MdcResult<()> {
        if self.timing_key.trim().is_empty() {
            return Err(MdcError::InvalidConfig(
                "timing_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    pub fn from_json_str(json: &str) -> MdcResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> MdcResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Builds a configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> MdcResult<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> MdcResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(ENV_TIMING_KEY) {
            config.timing_key = key;
        }
        if let Some(policy) = lookup(ENV_ON_UNBALANCED_POP) {
            config.on_unbalanced_pop = policy.parse()?;
        }
        if let Some(flag) = lookup(ENV_LOG_TRANSITIONS) {
            config.log_transitions = parse_bool(&flag)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> MdcResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(MdcError::InvalidConfig(format!(
            "expected a boolean for {ENV_LOG_TRANSITIONS}, got '{other}'"
        ))),
    }
}

static GLOBAL_CONFIG: RwLock<Option<Arc<ContextConfig>>> = RwLock::new(None);

/// Installs the process-wide configuration used by [`crate::ScopedContext::global`].
pub fn set_global_config(config: ContextConfig) -> MdcResult<()> {
    config.validate()?;
    *GLOBAL_CONFIG.write() = Some(Arc::new(config));
    tracing::debug!("Global context config installed");
    Ok(())
}

/// Restores the default process-wide configuration.
pub fn clear_global_config() {
    *GLOBAL_CONFIG.write() = None;
}

/// Returns the process-wide configuration.
pub fn global_config() -> Arc<ContextConfig> {
    GLOBAL_CONFIG
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(ContextConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ContextConfig::new();
        assert_eq!(config.timing_key, "operationTimeMs");
        assert_eq!(config.on_unbalanced_pop, UnbalancedPopPolicy::Panic);
        assert!(!config.log_transitions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ContextConfig::new()
            .with_timing_key("elapsed")
            .with_unbalanced_pop_policy(UnbalancedPopPolicy::Log)
            .with_log_transitions(true);

        assert_eq!(config.timing_key, "elapsed");
        assert_eq!(config.on_unbalanced_pop, UnbalancedPopPolicy::Log);
        assert!(config.log_transitions);
    }

    #[test]
    fn test_empty_timing_key_rejected() {
        let config = ContextConfig::new().with_timing_key("  ");
        assert!(matches!(config.validate(), Err(MdcError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json_partial() {
        let config = ContextConfig::from_json_str(r#"{"on_unbalanced_pop": "log"}"#).unwrap();
        assert_eq!(config.timing_key, DEFAULT_TIMING_KEY);
        assert_eq!(config.on_unbalanced_pop, UnbalancedPopPolicy::Log);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ContextConfig::from_json_str(r#"{"timing_key": ""}"#).unwrap_err();
        assert!(matches!(err, MdcError::InvalidConfig(_)));

        let err = ContextConfig::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, MdcError::Serialization(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"timing_key": "durationMs", "log_transitions": true}}"#
        )
        .unwrap();

        let config = ContextConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timing_key, "durationMs");
        assert!(config.log_transitions);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ContextConfig::from_file("/nonexistent/scoped-mdc.json").unwrap_err();
        assert!(matches!(err, MdcError::Io(_)));
    }

    #[test]
    fn test_from_env_with() {
        let vars: HashMap<&str, &str> = [
            (ENV_TIMING_KEY, "tookMs"),
            (ENV_ON_UNBALANCED_POP, "LOG"),
            (ENV_LOG_TRANSITIONS, "yes"),
        ]
        .into_iter()
        .collect();

        let config =
            ContextConfig::from_env_with(|name| vars.get(name).map(|v| (*v).to_string())).unwrap();
        assert_eq!(
            config,
            ContextConfig::new()
                .with_timing_key("tookMs")
                .with_unbalanced_pop_policy(UnbalancedPopPolicy::Log)
                .with_log_transitions(true)
        );
    }

    #[test]
    fn test_from_env_with_nothing_set() {
        let config = ContextConfig::from_env_with(|_| None).unwrap();
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_from_env_with_bad_values() {
        let err = ContextConfig::from_env_with(|name| {
            (name == ENV_ON_UNBALANCED_POP).then(|| "ignore".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("ignore"));

        let err = ContextConfig::from_env_with(|name| {
            (name == ENV_LOG_TRANSITIONS).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, MdcError::InvalidConfig(_)));
    }

    #[test]
    fn test_policy_serde() {
        let json = serde_json::to_string(&UnbalancedPopPolicy::Log).unwrap();
        assert_eq!(json, r#""log""#);
    }
}
