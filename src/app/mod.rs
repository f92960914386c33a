// app/mod.rs
// Starts the control thread that owns the evaluator

use crate::config::SNAPSHOT_THREADS;
use crate::evaluator::LineEvaluator;
use anyhow::{anyhow, Context};
use state::{send_command, FieldCommand, COMMAND_SENDER};

pub mod command_loop;
pub mod frame_loop;
pub mod state;

pub use frame_loop::{LoopExit, LoopOptions};

/// Run the control loop on its own thread until it exits, then hand the evaluator back.
///
/// `startup` commands are queued before the loop starts.
pub fn run(
    mut evaluator: LineEvaluator,
    startup: Vec<FieldCommand>,
    options: LoopOptions,
) -> anyhow::Result<(LineEvaluator, LoopExit)> {
    // Line snapshots are copied on a small rayon pool; the line workers keep the cores.
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(SNAPSHOT_THREADS)
        .build_global()
    {
        tracing::debug!(error = %err, "rayon global pool already configured");
    }

    let (tx, rx) = crossbeam::channel::unbounded();
    *COMMAND_SENDER.lock() = Some(tx);
    for cmd in startup {
        if !send_command(cmd) {
            return Err(anyhow!("control channel closed while queueing startup commands"));
        }
    }

    let handle = std::thread::Builder::new()
        .name("field-control".into())
        .spawn(move || {
            let exit = frame_loop::run_frame_loop(rx, &mut evaluator, options);
            (evaluator, exit)
        })
        .context("spawning control thread")?;

    let result = handle
        .join()
        .map_err(|_| anyhow!("control thread panicked"));
    *COMMAND_SENDER.lock() = None;
    result
}

#[cfg(test)]
mod tests;
