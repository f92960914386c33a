// app/frame_loop.rs
// Control thread: drains commands, settles the pool and publishes lines at a bounded rate

use super::command_loop;
use super::state::{FieldCommand, LINES_UPDATED, PUBLISHED_CHARGES, PUBLISHED_LINES};
use crate::config::MAX_PUBLISH_HZ;
use crate::evaluator::LineEvaluator;
use crate::profile_scope;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Default)]
pub struct LoopOptions {
    /// Leave the loop once no command is queued and every line is complete
    pub exit_when_settled: bool,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Settled,
    TimedOut,
    Disconnected,
}

/// Limits publishing to `hz` frames per second.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new(hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / hz.max(1),
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True (and the frame is consumed) when a full interval passed since the last frame.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

/// Copy fresh lines into the published state. Returns true when something was published.
pub fn publish(evaluator: &LineEvaluator) -> bool {
    profile_scope!("publish");
    let update = evaluator.poll_updated_lines();
    if !update.updated {
        return false;
    }
    *PUBLISHED_LINES.lock() = update.lines;
    *PUBLISHED_CHARGES.lock() = evaluator.charge_views();
    LINES_UPDATED.store(true, Ordering::Release);
    true
}

pub fn run_frame_loop(
    rx: Receiver<FieldCommand>,
    evaluator: &mut LineEvaluator,
    options: LoopOptions,
) -> LoopExit {
    let started = Instant::now();
    let mut pacer = FramePacer::new(MAX_PUBLISH_HZ);
    let mut frames = 0u64;
    #[cfg(feature = "profiling")]
    let mut last_report = Instant::now();

    let exit = loop {
        match rx.recv_timeout(pacer.until_next(Instant::now())) {
            Ok(cmd) => {
                if !command_loop::handle_command(cmd, evaluator) {
                    break LoopExit::Quit;
                }
                let mut quit = false;
                while let Ok(cmd) = rx.try_recv() {
                    if !command_loop::handle_command(cmd, evaluator) {
                        quit = true;
                        break;
                    }
                }
                if quit {
                    break LoopExit::Quit;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break LoopExit::Disconnected,
        }

        let settled = evaluator.settle();
        if pacer.ready(Instant::now()) && publish(evaluator) {
            frames += 1;
        }

        #[cfg(feature = "profiling")]
        {
            if last_report.elapsed() >= Duration::from_secs(1) {
                crate::PROFILER.lock().log_and_clear();
                last_report = Instant::now();
            }
        }

        if options.exit_when_settled && settled && rx.is_empty() {
            break LoopExit::Settled;
        }
        if options.timeout.map_or(false, |t| started.elapsed() >= t) {
            break LoopExit::TimedOut;
        }
    };

    if publish(evaluator) {
        frames += 1;
    }
    tracing::debug!(?exit, frames, elapsed = ?started.elapsed(), "frame loop finished");
    exit
}
