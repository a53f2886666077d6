//! # Kernel Configuration
//!
//! All knobs of a run, loaded once at startup. Values come either from
//! [`KernelConfig::default`] or from a TOML file, and the command line may
//! override individual fields afterwards.
//!
//! ```toml
//! threads = 10
//! buffer_size = 10
//! iterations = 100
//! delay_us = 10
//! monitor_ms = 100
//! self_swap = "count"
//! budget = "locked"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Default number of swap workers.
pub const DEFAULT_THREADS: usize = 10;
/// Default number of buffer slots.
pub const DEFAULT_BUFFER_SIZE: usize = 10;
/// Default operation budget.
pub const DEFAULT_ITERATIONS: u64 = 100;
/// Default per-step delay in microseconds.
pub const DEFAULT_DELAY_US: u64 = 10;
/// Default monitor poll interval in milliseconds.
pub const DEFAULT_MONITOR_MS: u64 = 100;

/// What a worker does when it draws the same slot twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfSwapPolicy {
    /// The draw is a completed operation that moves nothing. It is not
    /// announced: reporters only see swaps of two distinct slots.
    #[default]
    Count,
    /// Draw again without consuming more budget.
    ///
    /// A one-slot buffer has no distinct pair, so there the draw is counted.
    Redraw,
}

impl FromStr for SelfSwapPolicy {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "redraw" => Ok(Self::Redraw),
            other => Err(KernelError::InvalidConfig(format!(
                "unknown self-swap policy {other:?} (expected count or redraw)"
            ))),
        }
    }
}

impl fmt::Display for SelfSwapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Count => "count",
            Self::Redraw => "redraw",
        })
    }
}

/// Which operation budget implementation the workers share.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    /// Counter behind its own mutex.
    #[default]
    Locked,
    /// Atomic compare-and-decrement counter.
    Atomic,
}

impl FromStr for BudgetKind {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "locked" => Ok(Self::Locked),
            "atomic" => Ok(Self::Atomic),
            other => Err(KernelError::InvalidConfig(format!(
                "unknown budget kind {other:?} (expected locked or atomic)"
            ))),
        }
    }
}

impl fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Locked => "locked",
            Self::Atomic => "atomic",
        })
    }
}

/// Configuration of one kernel run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Number of swap workers.
    pub threads: usize,
    /// Number of buffer slots.
    pub buffer_size: usize,
    /// Total number of swap operations shared by all workers.
    pub iterations: u64,
    /// Pause between the steps of a swap, in microseconds. 0 disables it.
    pub delay_us: u64,
    /// Monitor poll interval in milliseconds. 0 disables the monitor.
    pub monitor_ms: u64,
    /// Base seed for the workers' index draws. `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Handling of `i == j` draws.
    pub self_swap: SelfSwapPolicy,
    /// Budget implementation.
    pub budget: BudgetKind,
    /// Track lock holders per slot and count overlapping holds.
    pub audit_locks: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            iterations: DEFAULT_ITERATIONS,
            delay_us: DEFAULT_DELAY_US,
            monitor_ms: DEFAULT_MONITOR_MS,
            seed: None,
            self_swap: SelfSwapPolicy::default(),
            budget: BudgetKind::default(),
            audit_locks: false,
        }
    }
}

impl KernelConfig {
    /// Parses and validates a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConfigParse`] for malformed TOML or unknown keys,
    /// and [`KernelError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> KernelResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ConfigIo`] if the file cannot be read, otherwise
    /// the same errors as [`KernelConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| KernelError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks the value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidConfig`] if there are no workers or no slots.
    pub fn validate(&self) -> KernelResult<()> {
        if self.threads == 0 {
            return Err(KernelError::InvalidConfig(
                "threads must be greater than zero".to_string(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(KernelError::InvalidConfig(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-step swap delay, `None` when disabled.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_us > 0).then(|| Duration::from_micros(self.delay_us))
    }

    /// Monitor poll interval, `None` when the monitor is disabled.
    #[must_use]
    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_ms > 0).then(|| Duration::from_millis(self.monitor_ms))
    }

    /// The configured seed, or one taken from the wall clock.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |elapsed| elapsed.as_nanos() as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_run() {
        let config = KernelConfig::default();
        assert_eq!(config.threads, 10);
        assert_eq!(config.buffer_size, 10);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.delay_us, 10);
        assert_eq!(config.self_swap, SelfSwapPolicy::Count);
        assert_eq!(config.budget, BudgetKind::Locked);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = KernelConfig::from_toml_str(
            r#"
            threads = 3
            iterations = 0
            self_swap = "redraw"
            budget = "atomic"
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.threads, 3);
        assert_eq!(config.iterations, 0);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.self_swap, SelfSwapPolicy::Redraw);
        assert_eq!(config.budget, BudgetKind::Atomic);
        assert_eq!(config.resolved_seed(), 42);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = KernelConfig::from_toml_str("threadz = 4").unwrap_err();
        assert!(matches!(err, KernelError::ConfigParse(_)));
    }

    #[test]
    fn test_zero_threads_or_slots_rejected() {
        let err = KernelConfig::from_toml_str("threads = 0").unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));

        let err = KernelConfig::from_toml_str("buffer_size = 0").unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }

    #[test]
    fn test_negative_values_do_not_parse() {
        assert!(KernelConfig::from_toml_str("iterations = -1").is_err());
        assert!(KernelConfig::from_toml_str("delay_us = -5").is_err());
    }

    #[test]
    fn test_zero_disables_delay_and_monitor() {
        let config = KernelConfig {
            delay_us: 0,
            monitor_ms: 0,
            ..KernelConfig::default()
        };
        assert_eq!(config.delay(), None);
        assert_eq!(config.monitor_interval(), None);

        let config = KernelConfig::default();
        assert_eq!(config.delay(), Some(Duration::from_micros(10)));
        assert_eq!(config.monitor_interval(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_policy_and_budget_from_str() {
        assert_eq!("COUNT".parse::<SelfSwapPolicy>().unwrap(), SelfSwapPolicy::Count);
        assert_eq!("redraw".parse::<SelfSwapPolicy>().unwrap(), SelfSwapPolicy::Redraw);
        assert!("retry".parse::<SelfSwapPolicy>().is_err());

        assert_eq!("atomic".parse::<BudgetKind>().unwrap(), BudgetKind::Atomic);
        assert_eq!(BudgetKind::Locked.to_string(), "locked");
        assert!("spin".parse::<BudgetKind>().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("lockswap_no_such_config.toml");
        let err = KernelConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, KernelError::ConfigIo { .. }));
    }
}
