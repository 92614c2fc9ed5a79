//! Retry policy configuration

use serde::{Deserialize, Serialize};

/// Retry policy for an operation against a project backend
///
/// The defaults describe the migration write policy: two attempts in total,
/// 200ms apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay strategy between attempts
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Multiplier for exponential backoff
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Delay before the second attempt, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            ..Self::default()
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    200
}
fn default_max_delay() -> u64 {
    5_000
}

/// Delay strategy between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// Retry immediately
    None,

    /// Same delay before every retry (default)
    #[default]
    FixedDelay,

    /// Delay grows by `backoff_multiplier` on every retry
    ExponentialBackoff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_migration_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.strategy, RetryStrategy::FixedDelay);
        assert_eq!(policy.initial_delay_ms, 200);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("max-attempts: 4").unwrap();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay_ms, 200);
        assert_eq!(policy.strategy, RetryStrategy::FixedDelay);
    }

    #[test]
    fn test_strategy_kebab_case() {
        let policy: RetryPolicy =
            serde_yaml_ng::from_str("strategy: exponential-backoff\ninitial-delay-ms: 50").unwrap();
        assert_eq!(policy.strategy, RetryStrategy::ExponentialBackoff);
        assert_eq!(policy.initial_delay_ms, 50);
    }
}
