// evaluator/task.rs
// Seeding geometry and the per-line integration task run by the pool

use crate::config::{MAX_LINES_PER_CHARGE_TOTAL, SEED_OFFSET_FACTOR};
use crate::field::{LineIntegrator, LineWriter};
use crate::pool::{PoolTask, TaskId, TaskStatus};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ultraviolet::DVec2;

/// Lines emitted by a positive charge, at most `MAX_LINES_PER_CHARGE_TOTAL`.
pub fn line_count(lines_per_charge: f64, magnitude: f64) -> usize {
    let lines = (lines_per_charge * magnitude.abs()).round();
    if lines.is_nan() {
        return 0;
    }
    lines.min(MAX_LINES_PER_CHARGE_TOTAL as f64) as usize
}

/// `count` points evenly spaced on the circle of radius `SEED_OFFSET_FACTOR x size`.
pub fn seed_points(center: DVec2, size: f64, count: usize) -> Vec<DVec2> {
    let radius = size * SEED_OFFSET_FACTOR;
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Grows one line: owns its integrator and the only writer of its buffer.
pub struct IntegrationTask {
    id: TaskId,
    integrator: LineIntegrator,
    writer: LineWriter,
    updated: Arc<AtomicBool>,
}

impl IntegrationTask {
    pub fn new(
        id: TaskId,
        integrator: LineIntegrator,
        writer: LineWriter,
        updated: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            integrator,
            writer,
            updated,
        }
    }
}

impl PoolTask for IntegrationTask {
    fn task_id(&self) -> TaskId {
        self.id
    }

    fn step(&mut self) -> TaskStatus {
        if self.writer.is_full() || !self.integrator.is_continuing() {
            return TaskStatus::Done;
        }

        let point = self.integrator.advance();
        let continuing = self.integrator.is_continuing();
        let absorbed = self.integrator.is_absorbed();
        // A stagnation stop leaves the position unchanged: nothing new to append.
        if continuing || absorbed {
            if self.writer.push(point) && absorbed {
                self.writer.mark_absorbed();
            }
            self.updated.store(true, Ordering::Release);
        }
        if !continuing {
            return TaskStatus::Done;
        }
        if self.writer.is_full() {
            TaskStatus::Done
        } else {
            TaskStatus::Live
        }
    }
}
