//! Solver configuration.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::Dispatch;

use super::error::HintError;
use super::hint::HintRegistry;

/// Minimum number of instructions a worker should get before a level is split.
pub const DEFAULT_MIN_WORK_PER_WORKER: usize = 50;

/// Scheduling and diagnostics knobs.
///
/// | Field | Default |
/// |-------|---------|
/// | `min_work_per_worker` | `50` |
/// | `nb_workers` | rayon's `current_num_threads()` |
/// | `debug_info` | `true` |
/// | `print_logs` | `true` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Levels with at most this many instructions run sequentially
    pub min_work_per_worker: usize,
    pub nb_workers: Option<usize>,
    /// Resolve the debug trace of a failing constraint
    pub debug_info: bool,
    /// Emit the circuit's log entries once solving ends
    pub print_logs: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_work_per_worker: DEFAULT_MIN_WORK_PER_WORKER,
            nb_workers: None,
            debug_info: true,
            print_logs: true,
        }
    }
}

impl SolverConfig {
    pub fn workers(&self) -> usize {
        self.nb_workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}

/// Everything a solve needs besides the system and the witness.
#[derive(Clone)]
pub struct SolverOptions {
    pub config: SolverConfig,
    pub hints: HintRegistry,
    /// Sink for solver events; silent by default
    pub logger: Dispatch,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            config: SolverConfig::default(),
            hints: HintRegistry::new(),
            logger: Dispatch::none(),
        }
    }
}

impl std::fmt::Debug for SolverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverOptions")
            .field("config", &self.config)
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hints(mut self, hints: HintRegistry) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_hint<H>(mut self, name: &str, function: H) -> Self
    where
        H: Fn(&BigUint, &[BigUint], &mut [BigUint]) -> Result<(), HintError>
            + Send
            + Sync
            + 'static,
    {
        self.hints.register(name, function);
        self
    }

    pub fn with_logger(mut self, logger: impl Into<Dispatch>) -> Self {
        self.logger = logger.into();
        self
    }

    pub fn with_workers(mut self, nb_workers: usize) -> Self {
        self.config.nb_workers = Some(nb_workers);
        self
    }

    pub fn with_min_work_per_worker(mut self, min_work: usize) -> Self {
        self.config.min_work_per_worker = min_work;
        self
    }

    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.config.debug_info = enabled;
        self
    }
}
