//! Reevaluation coordinator.
//!
//! [`LineEvaluator`] owns the charges, their line buffers and the worker pool.
//! Every change to the charges or to the evaluation settings stops the pool,
//! reseeds every line from scratch and restarts the workers. The render side
//! polls the "updated" flag and copies the published points.

mod task;

pub use task::{line_count, seed_points, IntegrationTask};

use crate::charge::{Charge, ChargeId, ChargeSet, ChargeSpec, ChargeView};
use crate::config::{ChargeStyle, EvalParams, ParamChanges, MIN_LINE_CAPACITY};
use crate::field::{to_point, FieldCharge, LineIntegrator, PointBuffer};
use crate::pool::{LinePool, TaskId};
use crate::profile_scope;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ultraviolet::{DVec2, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalState {
    /// No worker is running; the lines are complete.
    Idle,
    Computing,
}

/// Immutable copy of one line as drawn by the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolyLine {
    pub charge: ChargeId,
    pub points: Vec<Vec2>,
    /// Ended on a negative charge
    pub absorbed: bool,
}

/// Result of [`LineEvaluator::poll_updated_lines`]. `lines` is empty when
/// nothing changed since the previous poll.
#[derive(Clone, Debug, Default)]
pub struct LinesUpdate {
    pub updated: bool,
    pub lines: Vec<PolyLine>,
}

pub struct LineEvaluator {
    charges: ChargeSet,
    params: EvalParams,
    pool: LinePool<IntegrationTask>,
    state: EvalState,
    updated: Arc<AtomicBool>,
    epoch: u64,
}

impl LineEvaluator {
    pub fn new(params: EvalParams, style: ChargeStyle) -> Self {
        Self {
            charges: ChargeSet::new(style),
            params: params.clamped(),
            pool: LinePool::new(),
            state: EvalState::Idle,
            updated: Arc::new(AtomicBool::new(false)),
            epoch: 0,
        }
    }

    pub fn charges(&self) -> &ChargeSet {
        &self.charges
    }

    pub fn params(&self) -> &EvalParams {
        &self.params
    }

    pub fn state(&self) -> EvalState {
        self.state
    }

    /// Number of restarts so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn charge_views(&self) -> Vec<ChargeView> {
        self.charges.iter().map(Charge::view).collect()
    }

    /// Task ids handed to each worker in the current epoch.
    pub fn worker_assignments(&self) -> &[Vec<TaskId>] {
        self.pool.assignments()
    }

    /// Apply a batch of edits and restart once if any of them changed the charges.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut ChargeSet) -> R) -> R {
        let result = f(&mut self.charges);
        if self.charges.take_dirty() {
            self.reevaluate();
        }
        result
    }

    pub fn set_charges(&mut self, specs: impl IntoIterator<Item = ChargeSpec>) -> Vec<ChargeId> {
        self.edit(|set| set.replace(specs))
    }

    /// Add a minimum positive charge at `pos` and select it.
    pub fn add_charge(&mut self, pos: DVec2) -> ChargeId {
        self.edit(|set| set.add_default(pos))
    }

    pub fn add_charge_with(&mut self, pos: DVec2, magnitude: f64) -> ChargeId {
        self.edit(|set| set.insert(pos, magnitude))
    }

    pub fn remove_charge(&mut self, id: ChargeId) -> bool {
        self.edit(|set| set.remove(id))
    }

    pub fn move_charge(&mut self, id: ChargeId, pos: DVec2, align: bool) -> bool {
        self.edit(|set| set.move_to(id, pos, align))
    }

    pub fn set_magnitude(&mut self, id: ChargeId, magnitude: f64) -> bool {
        self.edit(|set| set.set_magnitude(id, magnitude))
    }

    pub fn step_magnitude(&mut self, id: ChargeId, notches: i32) -> bool {
        self.edit(|set| set.step_magnitude(id, notches))
    }

    pub fn select_at(&mut self, pos: DVec2) -> Option<ChargeId> {
        self.charges.select_at(pos)
    }

    pub fn select_or_add(&mut self, pos: DVec2) -> ChargeId {
        self.edit(|set| set.select_or_add(pos))
    }

    pub fn clear(&mut self) {
        self.edit(ChargeSet::clear)
    }

    /// Commit a settings draft. Out-of-range values are clamped first; the
    /// lines are recomputed only if some field actually differs.
    pub fn set_parameters(&mut self, draft: EvalParams) -> ParamChanges {
        let next = draft.clamped();
        let changes = next.diff(&self.params);
        if changes.any() {
            self.params = next;
            self.reevaluate();
        }
        changes
    }

    /// Stop the workers, drop every line and seed the new epoch.
    pub fn reevaluate(&mut self) {
        profile_scope!("reevaluate");
        self.pool.terminate();
        self.epoch += 1;

        let snapshot: Arc<[FieldCharge]> = self.charges.iter().map(Charge::field_charge).collect();
        let capacity = self.params.max_points_per_line.max(MIN_LINE_CAPACITY);
        let EvalParams {
            lines_per_charge,
            step_length,
            mode,
            ..
        } = self.params;

        let mut tasks = Vec::new();
        for charge in self.charges.iter_mut() {
            charge.lines.clear();
            if !charge.is_positive() {
                continue;
            }
            let count = line_count(lines_per_charge, charge.magnitude);
            for seed in seed_points(charge.pos, charge.size, count) {
                let (buffer, writer) =
                    PointBuffer::with_seed(capacity, &[to_point(charge.pos), to_point(seed)]);
                charge.lines.push(buffer);
                let integrator = LineIntegrator::new(seed, step_length, mode, Arc::clone(&snapshot));
                tasks.push(IntegrationTask::new(
                    TaskId(tasks.len()),
                    integrator,
                    writer,
                    Arc::clone(&self.updated),
                ));
            }
        }
        let lines = tasks.len();
        self.updated.store(true, Ordering::Release);

        if tasks.is_empty() {
            self.state = EvalState::Idle;
            tracing::debug!(epoch = self.epoch, charges = self.charges.len(), "no lines to evaluate");
            return;
        }

        let started = self
            .pool
            .submit(tasks)
            .and_then(|()| self.pool.start(self.params.workers));
        match started {
            Ok(workers) => {
                self.state = EvalState::Computing;
                tracing::debug!(
                    epoch = self.epoch,
                    charges = self.charges.len(),
                    lines,
                    workers,
                    "reevaluation started"
                );
            }
            Err(err) => {
                self.state = EvalState::Idle;
                tracing::error!(epoch = self.epoch, error = %err, "could not start line workers");
            }
        }
    }

    /// Join the pool once every worker ran out of work. Returns true when idle.
    pub fn settle(&mut self) -> bool {
        if self.state == EvalState::Computing && self.pool.is_finished() {
            self.pool.stop();
            self.state = EvalState::Idle;
            tracing::debug!(epoch = self.epoch, "all lines complete");
        }
        self.state == EvalState::Idle
    }

    pub fn is_settled(&self) -> bool {
        self.state == EvalState::Idle
    }

    /// Poll [`Self::settle`] until idle or `timeout` elapsed.
    pub fn wait_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.settle() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Non-blocking. Returns the lines only if something was appended or
    /// reseeded since the previous call.
    pub fn poll_updated_lines(&self) -> LinesUpdate {
        if !self.updated.swap(false, Ordering::AcqRel) {
            return LinesUpdate::default();
        }
        LinesUpdate {
            updated: true,
            lines: self.lines(),
        }
    }

    /// Copy every line's published points, in charge then seed order.
    pub fn lines(&self) -> Vec<PolyLine> {
        profile_scope!("snapshot_lines");
        let buffers: Vec<(ChargeId, &Arc<PointBuffer>)> = self
            .charges
            .iter()
            .flat_map(|charge| charge.lines.iter().map(move |line| (charge.id, line)))
            .collect();
        buffers
            .par_iter()
            .map(|(charge, buffer)| {
                // Flag first: once it reads true the snapped point is already published.
                let absorbed = buffer.is_absorbed();
                PolyLine {
                    charge: *charge,
                    points: buffer.snapshot(),
                    absorbed,
                }
            })
            .collect()
    }
}

impl Default for LineEvaluator {
    fn default() -> Self {
        Self::new(EvalParams::default(), ChargeStyle::default())
    }
}
