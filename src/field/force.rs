//! Analytic point-charge field.
//!
//! Everything here is a pure function of a charge slice and a position, so the
//! line workers call it concurrently on the epoch snapshot without locking.

use ultraviolet::DVec2;

/// Frozen view of one charge used by the integrators of an epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldCharge {
    pub pos: DVec2,
    pub magnitude: f64,
    /// Visual radius
    pub size: f64,
}

impl FieldCharge {
    pub fn new(pos: DVec2, magnitude: f64, size: f64) -> Self {
        Self { pos, magnitude, size }
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.magnitude.is_sign_negative()
    }
}

/// Superposed inverse-square force at `pos`.
///
/// No singularity guard: evaluating exactly at a charge center yields a non-finite vector.
#[inline]
pub fn force_at(pos: DVec2, charges: &[FieldCharge]) -> DVec2 {
    let mut force = DVec2::zero();
    for charge in charges {
        let r = pos - charge.pos;
        let dist2 = r.mag_sq();
        force += charge.magnitude * r / (dist2 * dist2.sqrt());
    }
    force
}

/// Force multiplied by the per-step length coefficient.
#[inline]
pub fn scaled_force_at(pos: DVec2, charges: &[FieldCharge], length: f64) -> DVec2 {
    force_at(pos, charges) * length
}

/// Unit vector along the force.
#[inline]
pub fn normalized_force_at(pos: DVec2, charges: &[FieldCharge]) -> DVec2 {
    let force = force_at(pos, charges);
    force / force.mag()
}

/// Unit force direction times the step length.
#[inline]
pub fn normalized_scaled_force_at(pos: DVec2, charges: &[FieldCharge], length: f64) -> DVec2 {
    normalized_force_at(pos, charges) * length
}

/// Electric potential (unit Coulomb constant) at `pos`.
pub fn potential_at(pos: DVec2, charges: &[FieldCharge]) -> f64 {
    charges
        .iter()
        .map(|charge| charge.magnitude / (pos - charge.pos).mag())
        .sum()
}
