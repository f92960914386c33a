// Centralized configuration for field line evaluation

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ====================
// Charge Parameters
// ====================
/// Smallest absolute magnitude a charge may hold; smaller values are clamped sign-preservingly.
pub const MIN_CHARGE: f64 = 1.0;
/// Exponent of the magnitude -> visual radius mapping.
pub const SIZE_POW: f64 = 0.47;
/// Coefficient of the magnitude -> visual radius mapping.
pub const SIZE_COEFF: f64 = 0.5;
/// Magnitude change per mouse wheel notch on a selected charge.
pub const WHEEL_CHARGE_STEP: f64 = 0.25;
/// Seed points sit this many visual radii away from the charge center.
pub const SEED_OFFSET_FACTOR: f64 = 2.0;
/// Lines are absorbed within this many visual radii of a negative charge.
pub const ABSORPTION_RADIUS_FACTOR: f64 = 2.0;
/// Grid step used when a moved charge is aligned to integer coordinates.
pub const ALIGN_GRID_STEP: f64 = 1.0;

// ====================
// Line Evaluation
// ====================
pub const DEFAULT_LINES_PER_CHARGE: f64 = 6.0;
pub const DEFAULT_STEP_LENGTH: f64 = 0.18;
pub const DEFAULT_LINE_EVAL_LENGTH: usize = 2_000;

pub const MIN_LINES_PER_CHARGE: f64 = 0.25;
pub const MAX_LINES_PER_CHARGE: f64 = 120.0;
pub const MIN_STEP_LENGTH: f64 = 0.001;
pub const MAX_STEP_LENGTH: f64 = 10.0;
pub const MIN_LINE_EVAL_LENGTH: usize = 1;
pub const MAX_LINE_EVAL_LENGTH: usize = 20_000;

/// Upper bound on the lines seeded at one charge, whatever its magnitude.
pub const MAX_LINES_PER_CHARGE_TOTAL: usize = 2_048;

/// Every buffer holds at least the charge center and the seed point.
pub const MIN_LINE_CAPACITY: usize = 2;

// ====================
// Threading/Parallelism
// ====================
pub const MIN_WORKERS: usize = 2; // Lower bound for the automatic worker count
pub const TASK_BATCH: usize = 8; // Advance() calls per task visit
pub const SNAPSHOT_THREADS: usize = 2; // rayon threads used to copy line snapshots

// ====================
// Frame/Publishing
// ====================
pub const MAX_PUBLISH_HZ: u32 = 24;

// ====================
// Scene Files
// ====================
/// Scene files must declare fewer charges than this.
pub const SCENE_MAX_CHARGES: usize = 2_000;
pub const DEFAULT_INIT_CONFIG: &str = "fieldlines.toml";

/// Numerical scheme used to advance a field line by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    /// RK4 whose every stage is the direction-normalized force times the step length.
    /// Lines advance by (nearly) constant arc length.
    StageNormalized,
    /// RK4 with normalized stages, then the combined offset rescaled to exactly one step length.
    PostNormalized,
    /// RK4 on the force scaled by the step length, no normalization (force-proportional steps).
    ForceScaled,
    /// Single normalized forward step.
    Euler,
}

impl Default for IntegrationMode {
    fn default() -> Self {
        IntegrationMode::StageNormalized
    }
}

impl std::str::FromStr for IntegrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stage_normalized" | "stage" => Ok(IntegrationMode::StageNormalized),
            "post_normalized" | "post" => Ok(IntegrationMode::PostNormalized),
            "force_scaled" | "scaled" => Ok(IntegrationMode::ForceScaled),
            "euler" => Ok(IntegrationMode::Euler),
            _ => Err(format!("Unknown integration mode: {}", s)),
        }
    }
}

/// Settings that shape the computed lines. Any change restarts evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalParams {
    /// Lines emitted per unit of positive magnitude
    pub lines_per_charge: f64,
    /// Arc length of one integration step
    pub step_length: f64,
    /// Point budget of every line
    pub max_points_per_line: usize,
    pub mode: IntegrationMode,
    /// Worker thread count, `None` derives it from the hardware
    pub workers: Option<usize>,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            lines_per_charge: DEFAULT_LINES_PER_CHARGE,
            step_length: DEFAULT_STEP_LENGTH,
            max_points_per_line: DEFAULT_LINE_EVAL_LENGTH,
            mode: IntegrationMode::StageNormalized,
            workers: None,
        }
    }
}

impl EvalParams {
    /// Clamp every field into its documented range. Non-finite values fall back to the defaults.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let lines_per_charge = if self.lines_per_charge.is_finite() {
            self.lines_per_charge
                .clamp(MIN_LINES_PER_CHARGE, MAX_LINES_PER_CHARGE)
        } else {
            defaults.lines_per_charge
        };
        let step_length = if self.step_length.is_finite() {
            self.step_length.clamp(MIN_STEP_LENGTH, MAX_STEP_LENGTH)
        } else {
            defaults.step_length
        };
        Self {
            lines_per_charge,
            step_length,
            max_points_per_line: self
                .max_points_per_line
                .clamp(MIN_LINE_EVAL_LENGTH, MAX_LINE_EVAL_LENGTH),
            mode: self.mode,
            workers: self.workers.map(|n| n.max(1)),
        }
    }

    /// Field-by-field difference against `other`.
    pub fn diff(&self, other: &EvalParams) -> ParamChanges {
        ParamChanges {
            lines_per_charge: self.lines_per_charge != other.lines_per_charge,
            step_length: self.step_length != other.step_length,
            max_points_per_line: self.max_points_per_line != other.max_points_per_line,
            mode: self.mode != other.mode,
            workers: self.workers != other.workers,
        }
    }
}

/// Which settings differed when a draft was committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamChanges {
    pub lines_per_charge: bool,
    pub step_length: bool,
    pub max_points_per_line: bool,
    pub mode: bool,
    pub workers: bool,
}

impl ParamChanges {
    pub fn any(&self) -> bool {
        self.lines_per_charge
            || self.step_length
            || self.max_points_per_line
            || self.mode
            || self.workers
    }
}

/// Magnitude clamping and the magnitude -> visual radius mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeStyle {
    pub min_charge: f64,
    pub size_pow: f64,
    pub size_coeff: f64,
}

impl Default for ChargeStyle {
    fn default() -> Self {
        Self {
            min_charge: MIN_CHARGE,
            size_pow: SIZE_POW,
            size_coeff: SIZE_COEFF,
        }
    }
}

impl ChargeStyle {
    pub fn visual_size(&self, magnitude: f64) -> f64 {
        magnitude.abs().powf(self.size_pow) * self.size_coeff
    }

    /// Raise `|magnitude|` to the minimum while keeping its sign (`0.0` becomes `+min`).
    pub fn clamp_magnitude(&self, magnitude: f64) -> f64 {
        if magnitude.abs() < self.min_charge {
            self.min_charge.copysign(magnitude)
        } else {
            magnitude
        }
    }
}

/// Live settings shared with the UI side. Edited through a draft and committed
/// to the evaluator, which diffs it field by field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    pub eval: EvalParams,
    pub style: ChargeStyle,
    /// Version number incremented whenever a commit changed something
    #[serde(skip)]
    pub config_version: u64,
}

impl EvalConfig {
    /// Copy of the live evaluation settings for editing.
    pub fn draft(&self) -> EvalParams {
        self.eval
    }
}

pub fn snap_to_grid(value: f64) -> f64 {
    (value / ALIGN_GRID_STEP).round() * ALIGN_GRID_STEP
}

pub static EVAL_CONFIG: Lazy<Mutex<EvalConfig>> = Lazy::new(|| Mutex::new(EvalConfig::default()));
