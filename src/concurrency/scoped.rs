//! Fork-join execution of one round of borrowed tasks.
//!
//! A round hands each worker a closure that borrows the frontier being read and
//! owns a `&mut` to its own output segment. Every closure must have returned
//! before the round's borrows end, so both executors here are scoped:
//! - [`WorkerPool::Scoped`] spawns one `std::thread::scope` thread per task
//! - `WorkerPool::Rayon` (feature `parallel`) runs tasks on a rayon pool that is
//!   built once and reused for every round

use std::thread;

use crate::error::ConfigError;

/// Executes the tasks of a round and joins them all before returning.
pub enum WorkerPool {
    /// Fresh scoped OS threads per round.
    Scoped,
    /// A fixed rayon pool reused across rounds.
    #[cfg(feature = "parallel")]
    Rayon(rayon::ThreadPool),
}

impl WorkerPool {
    /// Builds a rayon pool with exactly `threads` workers.
    #[cfg(feature = "parallel")]
    pub fn rayon(threads: usize) -> Result<Self, ConfigError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("parbfs-worker-{i}"))
            .build()
            .map(Self::Rayon)
            .map_err(|err| ConfigError::Pool(err.to_string()))
    }

    /// Builds the pool described by `kind`.
    pub fn build(kind: ExecutorKind, threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        match kind {
            ExecutorKind::Scoped => Ok(Self::Scoped),
            #[cfg(feature = "parallel")]
            ExecutorKind::Pool => Self::rayon(threads),
        }
    }

    /// Runs every task concurrently and returns their outcomes in task order.
    ///
    /// All tasks are joined before this returns, including when some of them
    /// panic; a panicking task shows up as `Err` with the panic payload.
    pub fn fork_join<'env, R, F>(&self, tasks: Vec<F>) -> Vec<thread::Result<R>>
    where
        F: FnOnce() -> R + Send + 'env,
        R: Send + 'env,
    {
        match self {
            Self::Scoped => thread::scope(|scope| {
                let handles: Vec<_> = tasks.into_iter().map(|task| scope.spawn(task)).collect();
                handles.into_iter().map(|h| h.join()).collect()
            }),
            #[cfg(feature = "parallel")]
            Self::Rayon(pool) => {
                use std::panic::{self, AssertUnwindSafe};

                let mut slots: Vec<Option<thread::Result<R>>> = tasks.iter().map(|_| None).collect();
                pool.scope(|scope| {
                    for (task, slot) in tasks.into_iter().zip(slots.iter_mut()) {
                        scope.spawn(move |_| *slot = Some(panic::catch_unwind(AssertUnwindSafe(task))));
                    }
                });
                slots
                    .into_iter()
                    .map(|slot| slot.unwrap_or_else(|| Err(Box::new("task did not run"))))
                    .collect()
            }
        }
    }
}

/// Which [`WorkerPool`] a search uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// [`WorkerPool::Scoped`].
    #[default]
    Scoped,
    /// `WorkerPool::Rayon`.
    #[cfg(feature = "parallel")]
    Pool,
}
