// charge/types.rs
// Contains the ChargeId handle, the Charge struct and its plain-data views

use crate::config::ChargeStyle;
use crate::field::{to_point, FieldCharge, PointBuffer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ultraviolet::{DVec2, Vec2};

/// Stable identifier of a charge inside a [`super::ChargeSet`]. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChargeId(pub u64);

impl std::fmt::Display for ChargeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Plain charge description as found in scene files and config tables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeSpec {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "charge")]
    pub magnitude: f64,
}

impl ChargeSpec {
    pub fn new(x: f64, y: f64, magnitude: f64) -> Self {
        Self { x, y, magnitude }
    }

    pub fn pos(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

#[derive(Clone, Debug)]
pub struct Charge {
    pub id: ChargeId,
    pub pos: DVec2,
    pub magnitude: f64,
    /// Visual radius, derived from the magnitude
    pub size: f64,
    /// Field lines seeded at this charge during the current epoch
    pub lines: Vec<Arc<PointBuffer>>,
}

impl Charge {
    pub fn new(id: ChargeId, pos: DVec2, magnitude: f64, style: &ChargeStyle) -> Self {
        let magnitude = style.clamp_magnitude(magnitude);
        Self {
            id,
            pos,
            magnitude,
            size: style.visual_size(magnitude),
            lines: Vec::new(),
        }
    }

    /// Store a new magnitude (clamped) and refresh the visual size.
    pub fn set_magnitude(&mut self, magnitude: f64, style: &ChargeStyle) {
        self.magnitude = style.clamp_magnitude(magnitude);
        self.size = style.visual_size(self.magnitude);
    }

    pub fn is_positive(&self) -> bool {
        self.magnitude > 0.0
    }

    pub fn contains(&self, point: DVec2) -> bool {
        (point - self.pos).mag_sq() <= self.size * self.size
    }

    pub fn field_charge(&self) -> FieldCharge {
        FieldCharge::new(self.pos, self.magnitude, self.size)
    }

    pub fn spec(&self) -> ChargeSpec {
        ChargeSpec::new(self.pos.x, self.pos.y, self.magnitude)
    }

    pub fn view(&self) -> ChargeView {
        ChargeView {
            id: self.id,
            pos: to_point(self.pos),
            magnitude: self.magnitude as f32,
            size: self.size as f32,
        }
    }
}

/// What the renderer needs to draw a charge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChargeView {
    pub id: ChargeId,
    pub pos: Vec2,
    pub magnitude: f32,
    pub size: f32,
}
