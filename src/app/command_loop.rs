// app/command_loop.rs
// Applies one FieldCommand to the evaluator

use super::state::FieldCommand;
use crate::config::EVAL_CONFIG;
use crate::evaluator::LineEvaluator;
use crate::io::{load_scene, save_scene};
use crate::profile_scope;

/// Returns false once the command asks the control thread to quit.
pub fn handle_command(cmd: FieldCommand, evaluator: &mut LineEvaluator) -> bool {
    profile_scope!("command_handling");
    match cmd {
        FieldCommand::AddCharge { pos, magnitude } => {
            let id = evaluator.add_charge_with(pos, magnitude);
            tracing::debug!(%id, x = pos.x, y = pos.y, magnitude, "charge added");
        }
        FieldCommand::SelectOrAdd { pos } => {
            evaluator.select_or_add(pos);
        }
        FieldCommand::Select { pos } => {
            evaluator.select_at(pos);
        }
        FieldCommand::MoveCharge { id, pos, align } => {
            evaluator.move_charge(id, pos, align);
        }
        FieldCommand::MoveSelected { pos, align } => {
            if let Some(id) = evaluator.charges().selected() {
                evaluator.move_charge(id, pos, align);
            }
        }
        FieldCommand::WheelSelected { notches } => {
            if let Some(id) = evaluator.charges().selected() {
                evaluator.step_magnitude(id, notches);
            }
        }
        FieldCommand::SetMagnitude { id, magnitude } => {
            evaluator.set_magnitude(id, magnitude);
        }
        FieldCommand::RemoveCharge { id } => {
            evaluator.remove_charge(id);
        }
        FieldCommand::RemoveSelected => {
            if let Some(id) = evaluator.charges().selected() {
                evaluator.remove_charge(id);
            }
        }
        FieldCommand::Clear => evaluator.clear(),
        FieldCommand::SetCharges { charges, append } => {
            if append {
                evaluator.edit(|set| set.extend(charges));
            } else {
                evaluator.set_charges(charges);
            }
        }
        FieldCommand::ApplySettings => {
            let draft = EVAL_CONFIG.lock().draft();
            let changes = evaluator.set_parameters(draft);
            // The live record always holds the clamped values the evaluator uses.
            let mut config = EVAL_CONFIG.lock();
            config.eval = *evaluator.params();
            if changes.any() {
                config.config_version += 1;
                tracing::info!(?changes, version = config.config_version, "settings applied");
            }
        }
        FieldCommand::LoadScene { path, append } => {
            // Parsed in full before anything is applied: a bad file leaves the scene as it was.
            match load_scene(&path, evaluator.charges().style()) {
                Ok(specs) => {
                    let count = specs.len();
                    if append {
                        evaluator.edit(|set| set.extend(specs));
                    } else {
                        evaluator.set_charges(specs);
                    }
                    tracing::info!(path = %path.display(), count, append, "scene loaded");
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "scene rejected");
                }
            }
        }
        FieldCommand::SaveScene { path } => {
            let specs = evaluator.charges().specs();
            if specs.is_empty() {
                tracing::info!(path = %path.display(), "empty scene, nothing saved");
            } else {
                match save_scene(&path, &specs) {
                    Ok(()) => tracing::info!(path = %path.display(), count = specs.len(), "scene saved"),
                    Err(err) => tracing::warn!(path = %path.display(), error = %err, "scene not saved"),
                }
            }
        }
        FieldCommand::Quit => return false,
    }
    true
}
