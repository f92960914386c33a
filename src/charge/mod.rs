// charge/mod.rs
// Re-exports for the charge module

mod set;
mod types;

pub use set::ChargeSet;
pub use types::*;
