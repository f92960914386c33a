// app/tests.rs
// Contains tests for command handling, frame pacing and the control thread

#[cfg(test)]
mod commands {
    use crate::app::command_loop::handle_command;
    use crate::app::state::FieldCommand;
    use crate::charge::ChargeSpec;
    use crate::config::{EvalParams, EVAL_CONFIG};
    use crate::evaluator::LineEvaluator;
    use ultraviolet::DVec2;

    fn scene() -> LineEvaluator {
        let mut ev = LineEvaluator::default();
        ev.set_charges(vec![
            ChargeSpec::new(0.0, 0.0, 1.0),
            ChargeSpec::new(0.0, 4.0, -1.0),
        ]);
        ev
    }

    #[test]
    fn failed_load_leaves_scene_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "3\ncharge=1 coord=0, 0\ncharge=oops\n").unwrap();

        let mut ev = scene();
        let before = ev.charges().specs();
        for append in [false, true] {
            assert!(handle_command(
                FieldCommand::LoadScene {
                    path: path.clone(),
                    append
                },
                &mut ev
            ));
            assert_eq!(ev.charges().specs(), before);
        }
    }

    #[test]
    fn load_replaces_or_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.txt");
        std::fs::write(&path, "1\ncharge=2 coord=5, 5\n").unwrap();

        let mut ev = scene();
        handle_command(FieldCommand::LoadScene { path: path.clone(), append: true }, &mut ev);
        assert_eq!(ev.charges().len(), 3);

        handle_command(FieldCommand::LoadScene { path, append: false }, &mut ev);
        assert_eq!(ev.charges().specs(), vec![ChargeSpec::new(5.0, 5.0, 2.0)]);
    }

    #[test]
    fn empty_scene_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        let mut ev = LineEvaluator::default();
        handle_command(FieldCommand::SaveScene { path: path.clone() }, &mut ev);
        assert!(!path.exists());

        let mut ev = scene();
        handle_command(FieldCommand::SaveScene { path: path.clone() }, &mut ev);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("2\n"));
    }

    #[test]
    fn selection_commands_act_on_selected_charge() {
        let mut ev = LineEvaluator::default();
        handle_command(FieldCommand::SelectOrAdd { pos: DVec2::new(1.0, 1.0) }, &mut ev);
        let id = ev.charges().selected().unwrap();

        handle_command(FieldCommand::WheelSelected { notches: 2 }, &mut ev);
        assert_eq!(ev.charges().get(id).map(|c| c.magnitude), Some(1.5));

        handle_command(
            FieldCommand::MoveSelected {
                pos: DVec2::new(2.2, 2.9),
                align: true,
            },
            &mut ev,
        );
        assert_eq!(ev.charges().get(id).map(|c| c.pos), Some(DVec2::new(2.0, 3.0)));

        handle_command(FieldCommand::RemoveSelected, &mut ev);
        assert!(ev.charges().is_empty());
        // Nothing selected any more: a no-op.
        handle_command(FieldCommand::WheelSelected { notches: 1 }, &mut ev);
    }

    #[test]
    fn applied_settings_commit_live_draft() {
        let mut ev = LineEvaluator::default();
        let version = {
            let mut config = EVAL_CONFIG.lock();
            config.eval = EvalParams {
                lines_per_charge: 9.0,
                step_length: 50.0,
                ..EvalParams::default()
            };
            config.config_version
        };
        handle_command(FieldCommand::ApplySettings, &mut ev);
        assert_eq!(ev.params().lines_per_charge, 9.0);
        {
            let config = EVAL_CONFIG.lock();
            // Written back clamped.
            assert_eq!(config.eval.step_length, 10.0);
            assert_eq!(config.config_version, version + 1);
        }

        // Same draft again: nothing to commit.
        handle_command(FieldCommand::ApplySettings, &mut ev);
        assert_eq!(EVAL_CONFIG.lock().config_version, version + 1);
    }

    #[test]
    fn quit_stops_handling() {
        let mut ev = LineEvaluator::default();
        assert!(!handle_command(FieldCommand::Quit, &mut ev));
        assert!(handle_command(FieldCommand::Clear, &mut ev));
    }
}

#[cfg(test)]
mod pacing {
    use crate::app::frame_loop::FramePacer;
    use std::time::{Duration, Instant};

    #[test]
    fn at_most_one_frame_per_interval() {
        let mut pacer = FramePacer::new(24);
        let t0 = Instant::now();
        assert_eq!(pacer.until_next(t0), Duration::ZERO);
        assert!(pacer.ready(t0));
        assert!(!pacer.ready(t0 + Duration::from_millis(10)));
        assert_eq!(
            pacer.until_next(t0 + Duration::from_millis(10)),
            pacer.interval() - Duration::from_millis(10)
        );
        assert!(pacer.ready(t0 + pacer.interval()));
    }
}

#[cfg(test)]
mod control_thread {
    use crate::app::state::{FieldCommand, LINES_UPDATED, PUBLISHED_CHARGES, PUBLISHED_LINES};
    use crate::app::{run, LoopExit, LoopOptions};
    use crate::charge::ChargeSpec;
    use crate::evaluator::LineEvaluator;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[test]
    fn headless_run_settles_and_publishes() {
        let startup = vec![FieldCommand::SetCharges {
            charges: vec![
                ChargeSpec::new(0.0, 0.0, 1.0),
                ChargeSpec::new(0.0, 4.0, -1.0),
            ],
            append: false,
        }];
        let options = LoopOptions {
            exit_when_settled: true,
            timeout: Some(Duration::from_secs(60)),
        };
        let (evaluator, exit) = run(LineEvaluator::default(), startup, options).unwrap();
        assert_eq!(exit, LoopExit::Settled);
        assert!(evaluator.is_settled());
        assert!(LINES_UPDATED.load(Ordering::Acquire));

        let lines = PUBLISHED_LINES.lock();
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| l.absorbed));
        assert_eq!(PUBLISHED_CHARGES.lock().len(), 2);
    }
}
