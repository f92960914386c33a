// app/state.rs
// Commands sent to the control thread and the data it publishes for drawing

use crate::charge::{ChargeId, ChargeSpec, ChargeView};
use crate::evaluator::PolyLine;
use crossbeam::channel::Sender;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use ultraviolet::DVec2;

/// Set when fresh lines were published; cleared by whoever draws them.
pub static LINES_UPDATED: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));
pub static PUBLISHED_LINES: Lazy<Mutex<Vec<PolyLine>>> = Lazy::new(|| Mutex::new(Vec::new()));
pub static PUBLISHED_CHARGES: Lazy<Mutex<Vec<ChargeView>>> = Lazy::new(|| Mutex::new(Vec::new()));

// Commands from the UI side to the control thread
#[derive(Clone, Debug, PartialEq)]
pub enum FieldCommand {
    AddCharge { pos: DVec2, magnitude: f64 },
    /// Click: select the charge under the cursor or drop a new one there
    SelectOrAdd { pos: DVec2 },
    Select { pos: DVec2 },
    MoveCharge { id: ChargeId, pos: DVec2, align: bool },
    MoveSelected { pos: DVec2, align: bool },
    /// Mouse wheel over the selected charge
    WheelSelected { notches: i32 },
    SetMagnitude { id: ChargeId, magnitude: f64 },
    RemoveCharge { id: ChargeId },
    RemoveSelected,
    Clear,
    SetCharges { charges: Vec<ChargeSpec>, append: bool },
    /// Commit the settings draft held in `EVAL_CONFIG`
    ApplySettings,
    LoadScene { path: PathBuf, append: bool },
    SaveScene { path: PathBuf },
    Quit,
}

pub static COMMAND_SENDER: Lazy<Mutex<Option<Sender<FieldCommand>>>> = Lazy::new(|| Mutex::new(None));

/// Queue a command for the control thread. False when no control thread is listening.
pub fn send_command(cmd: FieldCommand) -> bool {
    match COMMAND_SENDER.lock().as_ref() {
        Some(tx) => tx.send(cmd).is_ok(),
        None => false,
    }
}
