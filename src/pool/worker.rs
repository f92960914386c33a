// pool/worker.rs
// One line worker thread: owns a disjoint slice of the tasks until it is joined

use super::{PoolTask, TaskStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;
use std::thread::JoinHandle;

pub(crate) struct Worker<T> {
    index: usize,
    run: Arc<AtomicBool>,
    handle: Option<JoinHandle<Vec<T>>>,
}

impl<T: PoolTask> Worker<T> {
    /// Start a worker over `tasks`. If the thread cannot be created the tasks
    /// come back with the error.
    pub(crate) fn spawn(
        index: usize,
        tasks: Vec<T>,
        batch: usize,
    ) -> Result<Self, (std::io::Error, Vec<T>)> {
        let run = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&run);
        let handoff = Arc::new(Mutex::new(tasks));
        let claim = Arc::clone(&handoff);
        let spawned = std::thread::Builder::new()
            .name(format!("line-worker-{}", index))
            .spawn(move || {
                let tasks = std::mem::take(&mut *claim.lock());
                work(index, tasks, batch, &flag)
            });
        match spawned {
            Ok(handle) => Ok(Self {
                index,
                run,
                handle: Some(handle),
            }),
            Err(err) => Err((err, reclaim(&handoff))),
        }
    }

    pub(crate) fn request_stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    /// True once the thread left its loop (all tasks done or stop observed).
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Block until the thread exits and take back the tasks it did not finish.
    pub(crate) fn join(mut self) -> Vec<T> {
        self.request_stop();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(tasks)) => tasks,
            Some(Err(_)) => {
                tracing::warn!(worker = self.index, "line worker panicked, its tasks are lost");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

/// Tasks a never-started thread left in its handoff slot.
pub(crate) fn reclaim<T>(handoff: &Mutex<Vec<T>>) -> Vec<T> {
    std::mem::take(&mut *handoff.lock())
}

fn work<T: PoolTask>(index: usize, mut tasks: Vec<T>, batch: usize, run: &AtomicBool) -> Vec<T> {
    let mut passes = 0usize;
    while !tasks.is_empty() && run.load(Ordering::Acquire) {
        tasks.retain_mut(|task| {
            // Tasks not visited after a stop request are handed back untouched.
            if !run.load(Ordering::Relaxed) {
                return true;
            }
            for _ in 0..batch {
                if task.step() == TaskStatus::Done {
                    return false;
                }
            }
            true
        });
        passes += 1;
        std::thread::yield_now();
    }
    tracing::trace!(worker = index, passes, unfinished = tasks.len(), "line worker exited");
    tasks
}
