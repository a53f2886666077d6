//! # Kernel Error Types
//!
//! Everything that can go wrong before the concurrent phase starts, plus the
//! two ways a joined thread can surface a panic. Once workers are running
//! nothing in the swap path fails.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up or tearing down a run.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A setup-time reservation could not be satisfied.
    #[error("out of memory: cannot reserve {requested} entries for {what}")]
    OutOfMemory {
        /// What was being allocated.
        what: &'static str,
        /// Number of entries requested.
        requested: usize,
    },

    /// The operating system refused to create a thread.
    #[error("could not create {role} thread: {source}")]
    Spawn {
        /// Which thread was being created.
        role: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A swap worker panicked before finishing its share of the budget.
    #[error("swap worker #{0} panicked")]
    WorkerPanicked(usize),

    /// The monitor thread panicked.
    #[error("monitor thread panicked")]
    MonitorPanicked,

    /// The configuration file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    ConfigIo {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::KernelConfig`].
    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
