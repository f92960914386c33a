//! Single field line stepping.
//!
//! A [`LineIntegrator`] walks one line forward a step at a time over the
//! immutable charge snapshot of its epoch and stops for good once it enters a
//! negative charge.

use super::force::{normalized_scaled_force_at, scaled_force_at, FieldCharge};
use super::to_point;
use crate::config::{IntegrationMode, ABSORPTION_RADIUS_FACTOR};
use std::sync::Arc;
use ultraviolet::{DVec2, Vec2};

const HALF: f64 = 0.5;
const REV3: f64 = 1.0 / 3.0;
const REV6: f64 = 1.0 / 6.0;

#[derive(Clone, Debug)]
pub struct LineIntegrator {
    pos: DVec2,
    charges: Arc<[FieldCharge]>,
    step_length: f64,
    mode: IntegrationMode,
    continues: bool,
    absorbed: bool,
}

impl LineIntegrator {
    pub fn new(
        start: DVec2,
        step_length: f64,
        mode: IntegrationMode,
        charges: Arc<[FieldCharge]>,
    ) -> Self {
        Self {
            pos: start,
            charges,
            step_length,
            mode,
            continues: true,
            absorbed: false,
        }
    }

    /// False once the line was absorbed or hit a point without a defined direction.
    pub fn is_continuing(&self) -> bool {
        self.continues
    }

    /// True when the line ended on a negative charge rather than at a stagnation point.
    pub fn is_absorbed(&self) -> bool {
        self.absorbed
    }

    pub fn position(&self) -> DVec2 {
        self.pos
    }

    pub fn mode(&self) -> IntegrationMode {
        self.mode
    }

    /// Advance one step and return the new point in single precision.
    ///
    /// After the line has stopped this only repeats the last position.
    pub fn advance(&mut self) -> Vec2 {
        if !self.continues {
            return to_point(self.pos);
        }

        let next = self.pos + self.offset(self.pos);
        if !(next.x.is_finite() && next.y.is_finite()) {
            // Stagnation point: the field vanishes and has no direction to follow.
            self.continues = false;
            return to_point(self.pos);
        }

        self.pos = self.absorb(next);
        to_point(self.pos)
    }

    fn stage(&self, pos: DVec2) -> DVec2 {
        match self.mode {
            IntegrationMode::ForceScaled => scaled_force_at(pos, &self.charges, self.step_length),
            _ => normalized_scaled_force_at(pos, &self.charges, self.step_length),
        }
    }

    fn offset(&self, pos: DVec2) -> DVec2 {
        if self.mode == IntegrationMode::Euler {
            return self.stage(pos);
        }

        let k1 = self.stage(pos);
        let k2 = self.stage(pos + k1 * HALF);
        let k3 = self.stage(pos + k2 * HALF);
        let k4 = self.stage(pos + k3);
        let offset = k1 * REV6 + k2 * REV3 + k3 * REV3 + k4 * REV6;

        if self.mode == IntegrationMode::PostNormalized {
            offset * (self.step_length / offset.mag())
        } else {
            offset
        }
    }

    /// Snap onto the first negative charge whose absorption radius contains `next`.
    fn absorb(&mut self, next: DVec2) -> DVec2 {
        for charge in self.charges.iter().filter(|c| c.is_negative()) {
            let radius = charge.size * ABSORPTION_RADIUS_FACTOR;
            if (next - charge.pos).mag_sq() <= radius * radius {
                self.continues = false;
                self.absorbed = true;
                return charge.pos;
            }
        }
        next
    }
}
