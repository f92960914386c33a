// charge/set.rs
// Arena of charges keyed by stable ids, plus the current selection

use super::types::{Charge, ChargeId, ChargeSpec};
use crate::config::{self, ChargeStyle};
use std::collections::BTreeMap;
use ultraviolet::DVec2;

/// Charges in insertion order. Every mutating call that actually changes
/// something marks the set dirty; the evaluator takes the mark and restarts.
#[derive(Debug, Default)]
pub struct ChargeSet {
    style: ChargeStyle,
    charges: BTreeMap<ChargeId, Charge>,
    next_id: u64,
    selected: Option<ChargeId>,
    dirty: bool,
}

impl ChargeSet {
    pub fn new(style: ChargeStyle) -> Self {
        Self {
            style,
            charges: BTreeMap::new(),
            next_id: 1,
            selected: None,
            dirty: false,
        }
    }

    pub fn style(&self) -> &ChargeStyle {
        &self.style
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    pub fn get(&self, id: ChargeId) -> Option<&Charge> {
        self.charges.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Charge> {
        self.charges.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Charge> {
        self.charges.values_mut()
    }

    pub fn ids(&self) -> Vec<ChargeId> {
        self.charges.keys().copied().collect()
    }

    pub fn specs(&self) -> Vec<ChargeSpec> {
        self.iter().map(Charge::spec).collect()
    }

    /// Insert a charge; the magnitude is clamped to the style minimum.
    pub fn insert(&mut self, pos: DVec2, magnitude: f64) -> ChargeId {
        let id = ChargeId(self.next_id);
        self.next_id += 1;
        self.charges
            .insert(id, Charge::new(id, pos, magnitude, &self.style));
        self.dirty = true;
        id
    }

    /// Insert at the minimum positive magnitude and select the new charge.
    pub fn add_default(&mut self, pos: DVec2) -> ChargeId {
        let id = self.insert(pos, self.style.min_charge);
        self.selected = Some(id);
        id
    }

    /// Append every spec, skipping non-finite entries.
    pub fn extend(&mut self, specs: impl IntoIterator<Item = ChargeSpec>) -> Vec<ChargeId> {
        specs
            .into_iter()
            .filter(|s| s.x.is_finite() && s.y.is_finite() && s.magnitude.is_finite())
            .map(|s| self.insert(s.pos(), s.magnitude))
            .collect()
    }

    /// Replace the whole set.
    pub fn replace(&mut self, specs: impl IntoIterator<Item = ChargeSpec>) -> Vec<ChargeId> {
        self.clear();
        self.dirty = true;
        self.extend(specs)
    }

    pub fn remove(&mut self, id: ChargeId) -> bool {
        let removed = self.charges.remove(&id).is_some();
        if removed {
            if self.selected == Some(id) {
                self.selected = None;
            }
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.charges.is_empty() {
            self.dirty = true;
        }
        self.charges.clear();
        self.selected = None;
    }

    /// Move a charge; with `align` the target is snapped to the grid first.
    pub fn move_to(&mut self, id: ChargeId, pos: DVec2, align: bool) -> bool {
        let pos = if align {
            DVec2::new(config::snap_to_grid(pos.x), config::snap_to_grid(pos.y))
        } else {
            pos
        };
        if !(pos.x.is_finite() && pos.y.is_finite()) {
            return false;
        }
        match self.charges.get_mut(&id) {
            Some(charge) if charge.pos != pos => {
                charge.pos = pos;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn set_magnitude(&mut self, id: ChargeId, magnitude: f64) -> bool {
        if !magnitude.is_finite() {
            return false;
        }
        let style = self.style;
        match self.charges.get_mut(&id) {
            Some(charge) => {
                let old = charge.magnitude;
                charge.set_magnitude(magnitude, &style);
                let changed = charge.magnitude != old;
                self.dirty |= changed;
                changed
            }
            None => false,
        }
    }

    /// Mouse wheel editing: every notch adds `WHEEL_CHARGE_STEP`. A value that
    /// would cross zero or fall inside the forbidden band `(-min, min)` jumps to
    /// the minimum of the opposite sign.
    pub fn step_magnitude(&mut self, id: ChargeId, notches: i32) -> bool {
        let Some(old) = self.charges.get(&id).map(|c| c.magnitude) else {
            return false;
        };
        if notches == 0 {
            return false;
        }
        let min = self.style.min_charge;
        let mut new = old + notches as f64 * config::WHEEL_CHARGE_STEP;
        if new.abs() < min || new.is_sign_negative() != old.is_sign_negative() {
            new = -min.copysign(old);
        }
        self.set_magnitude(id, new)
    }

    /// First charge whose visual disc contains `pos`.
    pub fn hit_test(&self, pos: DVec2) -> Option<ChargeId> {
        self.iter().find(|c| c.contains(pos)).map(|c| c.id)
    }

    pub fn selected(&self) -> Option<ChargeId> {
        self.selected
    }

    /// Select the charge under `pos`, clearing the selection when there is none.
    pub fn select_at(&mut self, pos: DVec2) -> Option<ChargeId> {
        self.selected = self.hit_test(pos);
        self.selected
    }

    /// Select the charge under `pos`, or add (and select) a new one there.
    pub fn select_or_add(&mut self, pos: DVec2) -> ChargeId {
        match self.select_at(pos) {
            Some(id) => id,
            None => self.add_default(pos),
        }
    }

    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
