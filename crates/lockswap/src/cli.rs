//! Command line parsing.
//!
//! ```text
//! lockswap [-c FILE] [-t N] [-s N] [-i N] [-d US] [-m MS] [--seed N]
//!          [--policy count|redraw] [--budget locked|atomic] [--audit]
//!          [--log-output] [-q]
//! ```

use std::path::PathBuf;

use lockswap_core::{BudgetKind, KernelConfig, KernelResult, SelfSwapPolicy};

/// Help text printed for `-h` and after a command line error.
pub const USAGE: &str = "\
Usage: lockswap [OPTIONS]

Options:
  -t, --threads <N>          Number of swap workers (default: 10)
  -s, --size <N>             Number of buffer slots (default: 10)
  -i, --iterations <N>       Total swap operations (default: 100)
  -d, --delay <US>           Pause between swap steps in microseconds, 0 = none (default: 10)
  -m, --monitor-ms <MS>      Monitor snapshot interval, 0 = no monitor (default: 100)
      --seed <N>             Base seed for the random index draws
      --policy <POLICY>      Same-slot draws: count | redraw (default: count)
      --budget <KIND>        Budget counter: locked | atomic (default: locked)
      --audit                Track slot lock holders and report overlaps
      --log-output           Report through tracing on stderr instead of stdout lines
  -c, --config <FILE>        Load options from a TOML file first
  -q, --quiet                Do not print one line per swap
  -h, --help                 Show this help";

/// Command line errors. All of them exit with status 2.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CliError {
    /// A flag that takes a value was last on the line.
    #[error("missing value for {0}")]
    MissingValue(String),

    /// A flag value did not parse.
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue {
        /// The flag as written.
        flag: String,
        /// The rejected value.
        value: String,
    },

    /// Not a known flag.
    #[error("unknown option {0}")]
    UnknownFlag(String),
}

/// What the user asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the kernel.
    Run(CliArgs),
    /// Print usage and exit.
    Help,
}

/// Parsed options. `None` keeps the value from the config file or the default.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `-c/--config`
    pub config: Option<PathBuf>,
    /// `-t/--threads`
    pub threads: Option<usize>,
    /// `-s/--size`
    pub buffer_size: Option<usize>,
    /// `-i/--iterations`
    pub iterations: Option<u64>,
    /// `-d/--delay`
    pub delay_us: Option<u64>,
    /// `-m/--monitor-ms`
    pub monitor_ms: Option<u64>,
    /// `--seed`
    pub seed: Option<u64>,
    /// `--policy`
    pub self_swap: Option<SelfSwapPolicy>,
    /// `--budget`
    pub budget: Option<BudgetKind>,
    /// `--audit`
    pub audit_locks: bool,
    /// `-q/--quiet`
    pub quiet: bool,
    /// `--log-output`
    pub log_output: bool,
}

impl CliArgs {
    /// Builds the run configuration: config file (or defaults), then overrides.
    ///
    /// # Errors
    ///
    /// Returns the config file's read or parse error, or
    /// [`lockswap_core::KernelError::InvalidConfig`] if the result is out of range.
    pub fn to_config(&self) -> KernelResult<KernelConfig> {
        let mut config = match &self.config {
            Some(path) => KernelConfig::from_file(path)?,
            None => KernelConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Writes every given override into `config`.
    pub fn apply(&self, config: &mut KernelConfig) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(size) = self.buffer_size {
            config.buffer_size = size;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(delay) = self.delay_us {
            config.delay_us = delay;
        }
        if let Some(interval) = self.monitor_ms {
            config.monitor_ms = interval;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(policy) = self.self_swap {
            config.self_swap = policy;
        }
        if let Some(budget) = self.budget {
            config.budget = budget;
        }
        config.audit_locks |= self.audit_locks;
    }
}

/// Parses the arguments after the program name.
///
/// # Errors
///
/// Returns a [`CliError`] for unknown flags, missing values and values that do
/// not parse.
pub fn parse<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-t" | "--threads" => parsed.threads = Some(value(&flag, args.next())?),
            "-s" | "--size" => parsed.buffer_size = Some(value(&flag, args.next())?),
            "-i" | "--iterations" => parsed.iterations = Some(value(&flag, args.next())?),
            "-d" | "--delay" => parsed.delay_us = Some(value(&flag, args.next())?),
            "-m" | "--monitor-ms" => parsed.monitor_ms = Some(value(&flag, args.next())?),
            "--seed" => parsed.seed = Some(value(&flag, args.next())?),
            "--policy" => parsed.self_swap = Some(value(&flag, args.next())?),
            "--budget" => parsed.budget = Some(value(&flag, args.next())?),
            "-c" | "--config" => parsed.config = Some(value(&flag, args.next())?),
            "--audit" => parsed.audit_locks = true,
            "-q" | "--quiet" => parsed.quiet = true,
            "--log-output" => parsed.log_output = true,
            "-h" | "--help" => return Ok(Command::Help),
            _ => return Err(CliError::UnknownFlag(flag)),
        }
    }

    Ok(Command::Run(parsed))
}

fn value<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> Result<T, CliError> {
    let raw = raw.ok_or_else(|| CliError::MissingValue(flag.to_string()))?;
    raw.parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value: raw,
    })
}
