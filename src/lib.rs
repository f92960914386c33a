pub mod app;
pub mod charge;
pub mod config;
pub mod evaluator;
pub mod field;
pub mod init_config;
pub mod io;
pub mod pool;
pub mod profiler;

pub use charge::{ChargeId, ChargeSet, ChargeSpec};
pub use config::{EvalParams, IntegrationMode};
pub use evaluator::{EvalState, LineEvaluator, LinesUpdate, PolyLine};

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
