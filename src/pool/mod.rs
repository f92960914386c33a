//! Fixed pool of line workers.
//!
//! [`LinePool`] is an explicit start/stop state machine. Tasks are only
//! submitted while it is stopped; `start` partitions them into disjoint slices,
//! one per worker thread, and `stop` joins every worker and takes the
//! unfinished tasks back so a later `start` resumes them.

mod worker;

use crate::config::{MIN_WORKERS, TASK_BATCH};
use worker::Worker;

/// Identifier of a task within one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Live,
    Done,
}

/// Unit of work driven by a worker one step at a time.
pub trait PoolTask: Send + 'static {
    fn task_id(&self) -> TaskId;
    /// Perform one step. Returning `Done` drops the task from its worker.
    fn step(&mut self) -> TaskStatus;
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("tasks can only be submitted while the pool is stopped")]
    Running,
    /// Every task, including the failed worker's share, stays pending in the pool.
    #[error("failed to spawn line worker {index}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolState {
    Stopped,
    Running,
}

pub struct LinePool<T: PoolTask> {
    tasks: Vec<T>,
    workers: Vec<Worker<T>>,
    assignments: Vec<Vec<TaskId>>,
    batch: usize,
}

impl<T: PoolTask> Default for LinePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PoolTask> LinePool<T> {
    pub fn new() -> Self {
        Self::with_batch(TASK_BATCH)
    }

    pub fn with_batch(batch: usize) -> Self {
        Self {
            tasks: Vec::new(),
            workers: Vec::new(),
            assignments: Vec::new(),
            batch: batch.max(1),
        }
    }

    pub fn state(&self) -> PoolState {
        if self.workers.is_empty() {
            PoolState::Stopped
        } else {
            PoolState::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PoolState::Running
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Tasks held by the pool while stopped.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Replace the task set.
    pub fn submit(&mut self, tasks: Vec<T>) -> Result<(), PoolError> {
        if self.is_running() {
            tracing::warn!(tasks = tasks.len(), "submit rejected, pool is running");
            return Err(PoolError::Running);
        }
        self.tasks = tasks;
        self.assignments.clear();
        Ok(())
    }

    /// Spawn workers over the pending tasks and return how many were started.
    ///
    /// A running pool is stopped first so its unfinished tasks are
    /// repartitioned. Zero pending tasks start nothing.
    pub fn start(&mut self, requested: Option<usize>) -> Result<usize, PoolError> {
        self.stop();
        let count = resolve_worker_count(requested, self.tasks.len());
        if count == 0 {
            return Ok(0);
        }

        let mut remaining = std::mem::take(&mut self.tasks).into_iter();
        for (index, size) in partition_sizes(remaining.len(), count).into_iter().enumerate() {
            let slice: Vec<T> = remaining.by_ref().take(size).collect();
            let ids = slice.iter().map(|task| task.task_id()).collect();
            match Worker::spawn(index, slice, self.batch) {
                Ok(worker) => {
                    self.workers.push(worker);
                    self.assignments.push(ids);
                }
                Err((source, slice)) => {
                    tracing::warn!(worker = index, error = %source, "line worker spawn failed");
                    self.tasks.extend(slice);
                    self.tasks.extend(remaining);
                    self.stop();
                    self.assignments.clear();
                    return Err(PoolError::Spawn { index, source });
                }
            }
        }
        Ok(count)
    }

    /// Clear every run flag and join all workers. Idempotent.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        for worker in &self.workers {
            worker.request_stop();
        }
        for worker in self.workers.drain(..) {
            self.tasks.extend(worker.join());
        }
        self.tasks.sort_by_key(|task| task.task_id());
    }

    /// Stop and drop every task.
    pub fn terminate(&mut self) {
        self.stop();
        self.tasks.clear();
        self.assignments.clear();
    }

    /// True when no task is pending and every worker left its loop on its own.
    pub fn is_finished(&self) -> bool {
        self.tasks.is_empty() && self.workers.iter().all(|worker| worker.is_finished())
    }

    /// Task ids handed to each worker by the last `start`.
    pub fn assignments(&self) -> &[Vec<TaskId>] {
        &self.assignments
    }
}

impl<T: PoolTask> Drop for LinePool<T> {
    fn drop(&mut self) {
        self.terminate();
    }
}

pub fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Worker count for `tasks` tasks. Automatic: hardware parallelism, at least
/// `MIN_WORKERS`. Explicit: clamped to `[1, 2 x parallelism]`. Never more than
/// the task count.
pub fn resolve_worker_count(requested: Option<usize>, tasks: usize) -> usize {
    let hw = available_parallelism();
    let wanted = match requested {
        None => hw.max(MIN_WORKERS),
        Some(n) => n.clamp(1, 2 * hw),
    };
    wanted.min(tasks)
}

/// Split `total` into `workers` near-equal parts, the remainder going one each
/// to the first parts.
pub fn partition_sizes(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let rest = total % workers;
    (0..workers).map(|i| base + usize::from(i < rest)).collect()
}
