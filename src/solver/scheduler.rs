//! Level-by-level execution.
//!
//! Levels run in order with a barrier between them. A level small enough to
//! fit one worker runs on the calling thread; larger levels are cut into
//! contiguous chunks handed to a rayon pool that lives for the whole solve.

use std::ops::Range;
use std::sync::OnceLock;

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::Solver;
use super::config::SolverConfig;
use super::error::SolveError;
use crate::field::CurveField;

/// Splits `0..len` into at most `nb_workers` contiguous chunks of roughly
/// `min_work` items or more. Chunk sizes differ by at most one, the larger
/// ones first.
pub fn chunk_ranges(len: usize, nb_workers: usize, min_work: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let max_tasks = len.div_ceil(min_work.max(1));
    let nb_tasks = nb_workers.max(1).min(max_tasks);
    let per_task = len / nb_tasks;
    let mut extra = len - nb_tasks * per_task;

    let mut ranges = Vec::with_capacity(nb_tasks);
    let mut start = 0;
    for _ in 0..nb_tasks {
        let mut end = start + per_task;
        if extra > 0 {
            end += 1;
            extra -= 1;
        }
        ranges.push(start..end);
        start = end;
    }
    ranges
}

impl<F: CurveField> Solver<'_, F> {
    /// Processes every level, then checks that all wires got a value.
    pub(crate) fn run(&self, config: &SolverConfig) -> Result<(), SolveError> {
        let nb_workers = config.workers();
        let mut pool: Option<ThreadPool> = None;

        for (depth, level) in self.system.levels.iter().enumerate() {
            if level.len() <= config.min_work_per_worker {
                for &i in level {
                    self.process_instruction(i)?;
                }
                continue;
            }

            let pool = match pool.as_mut() {
                Some(p) => p,
                None => pool.insert(
                    ThreadPoolBuilder::new()
                        .num_threads(nb_workers)
                        .thread_name(|i| format!("solver-{i}"))
                        .build()?,
                ),
            };
            let chunks = chunk_ranges(level.len(), nb_workers, config.min_work_per_worker);
            tracing::trace!(depth, size = level.len(), tasks = chunks.len(), "parallel level");

            let first_error = OnceLock::new();
            pool.scope(|scope| {
                for range in chunks {
                    let task = &level[range];
                    let first_error = &first_error;
                    scope.spawn(move |_| {
                        for &i in task {
                            if let Err(err) = self.process_instruction(i) {
                                let _ = first_error.set(err);
                                return;
                            }
                        }
                    });
                }
            });
            if let Some(err) = first_error.into_inner() {
                return Err(err);
            }
        }

        let solved = self.nb_solved();
        if solved != self.nb_wires() {
            return Err(SolveError::IncompleteAssignment {
                solved,
                total: self.nb_wires(),
            });
        }
        Ok(())
    }
}
