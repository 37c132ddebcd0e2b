//! Bounded parallel map used to score particles.
//!
//! Callers hand over an explicit task list; results come back in task order, so anything
//! computed from them is independent of the number of workers or how rayon schedules them.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

use crate::error::Result;

/// Parallelism strategy for particle scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// Score on the calling thread.
    Sequential,
    /// Score on a dedicated pool of `n` workers.
    ///
    /// If `n <= 1`, this is equivalent to `Sequential`.
    Parallel(usize),
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::Sequential
    }
}

impl Parallelism {
    /// - `0` → rayon's current thread count
    /// - `1` → sequential
    /// - `n > 1` → parallel with n threads
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        match n_threads {
            0 => Self::Parallel(rayon::current_num_threads()),
            1 => Self::Sequential,
            n => Self::Parallel(n),
        }
    }

    #[inline]
    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Parallel(n) if n > 1)
    }

    #[inline]
    pub fn n_threads(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(n) => n.max(1),
        }
    }
}

/// A worker pool sized once per session.
///
/// Cloning shares the underlying rayon pool.
#[derive(Clone)]
pub struct WorkerPool {
    parallelism: Parallelism,
    pool: Option<Arc<ThreadPool>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

impl WorkerPool {
    pub fn new(parallelism: Parallelism) -> Result<Self> {
        let pool = if parallelism.allows_parallel() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(parallelism.n_threads())
                .build()?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self { parallelism, pool })
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Applies `f` to every task and returns the results in task order.
    pub fn map<T, R, F>(&self, tasks: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| tasks.into_par_iter().map(&f).collect()),
            None => tasks.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_threads() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel(4));
        assert!(matches!(Parallelism::from_threads(0), Parallelism::Parallel(_)));
    }

    #[test]
    fn test_allows_parallel() {
        assert!(!Parallelism::Sequential.allows_parallel());
        assert!(!Parallelism::Parallel(1).allows_parallel());
        assert!(Parallelism::Parallel(2).allows_parallel());
    }

    #[test]
    fn map_preserves_task_order() {
        let tasks: Vec<usize> = (0..1000).collect();
        let sequential = WorkerPool::new(Parallelism::Sequential)
            .unwrap()
            .map(tasks.clone(), |i| i * i);
        let parallel = WorkerPool::new(Parallelism::Parallel(4))
            .unwrap()
            .map(tasks, |i| i * i);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[31], 961);
    }
}
