#[cfg(test)]
mod force {
    use crate::field::*;
    use ultraviolet::DVec2;

    fn unit(pos: DVec2, magnitude: f64) -> FieldCharge {
        FieldCharge::new(pos, magnitude, 0.5)
    }

    #[test]
    fn single_charge_follows_inverse_square() {
        let charges = [unit(DVec2::zero(), 1.0)];
        let f = force_at(DVec2::new(2.0, 0.0), &charges);
        assert!((f.x - 0.25).abs() < 1e-12, "f = {:?}", f);
        assert!(f.y.abs() < 1e-12);

        let f = force_at(DVec2::new(0.0, -4.0), &charges);
        assert!((f.y + 1.0 / 16.0).abs() < 1e-12, "f = {:?}", f);
    }

    #[test]
    fn forces_superpose() {
        let charges = [
            unit(DVec2::new(-1.0, 0.0), 1.0),
            unit(DVec2::new(1.0, 0.0), -1.0),
        ];
        let f = force_at(DVec2::zero(), &charges);
        assert!((f.x - 2.0).abs() < 1e-12, "f = {:?}", f);
        assert!(f.y.abs() < 1e-12);
    }

    #[test]
    fn normalized_helpers_share_direction() {
        let charges = [
            unit(DVec2::new(-1.0, 0.5), 2.0),
            unit(DVec2::new(1.5, -0.5), -1.0),
        ];
        let pos = DVec2::new(0.3, 2.0);
        let raw = force_at(pos, &charges);
        let dir = normalized_force_at(pos, &charges);
        let scaled = scaled_force_at(pos, &charges, 0.18);
        let step = normalized_scaled_force_at(pos, &charges, 0.18);

        assert!((dir.mag() - 1.0).abs() < 1e-12);
        assert!((step.mag() - 0.18).abs() < 1e-12);
        assert!((scaled - raw * 0.18).mag() < 1e-12);
        assert!(dir.dot(raw.normalized()) > 1.0 - 1e-12);
    }

    #[test]
    fn potential_sums_over_charges() {
        let charges = [
            unit(DVec2::new(-1.0, 0.0), 1.0),
            unit(DVec2::new(1.0, 0.0), -1.0),
        ];
        assert!(potential_at(DVec2::new(0.0, 3.0), &charges).abs() < 1e-12);
        let v = potential_at(DVec2::new(-3.0, 0.0), &charges);
        assert!((v - (0.5 - 0.25)).abs() < 1e-12, "v = {}", v);
    }
}

#[cfg(test)]
mod integrator {
    use crate::config::IntegrationMode;
    use crate::field::*;
    use std::sync::Arc;
    use ultraviolet::{DVec2, Vec2};

    fn lone_positive() -> Arc<[FieldCharge]> {
        vec![FieldCharge::new(DVec2::zero(), 1.0, 0.5)].into()
    }

    fn dipole() -> Arc<[FieldCharge]> {
        vec![
            FieldCharge::new(DVec2::zero(), 1.0, 0.5),
            FieldCharge::new(DVec2::new(3.0, 0.0), -1.0, 0.5),
        ]
        .into()
    }

    #[test]
    fn stage_normalized_step_has_constant_length() {
        let mut line = LineIntegrator::new(
            DVec2::new(1.0, 0.0),
            0.18,
            IntegrationMode::StageNormalized,
            lone_positive(),
        );
        let p = line.advance();
        assert!(line.is_continuing());
        assert!((line.position().x - 1.18).abs() < 1e-12, "pos = {:?}", line.position());
        assert!(line.position().y.abs() < 1e-12);
        assert_eq!(p, Vec2::new(line.position().x as f32, 0.0));
    }

    #[test]
    fn force_scaled_step_shrinks_with_field_strength() {
        let mut line = LineIntegrator::new(
            DVec2::new(1.0, 0.0),
            0.18,
            IntegrationMode::ForceScaled,
            lone_positive(),
        );
        line.advance();
        let dx = line.position().x - 1.0;
        assert!(dx > 0.14 && dx < 0.17, "dx = {}", dx);

        // Far from the charge the field is weak and so is the step.
        let mut far = LineIntegrator::new(
            DVec2::new(10.0, 0.0),
            0.18,
            IntegrationMode::ForceScaled,
            lone_positive(),
        );
        far.advance();
        assert!(far.position().x - 10.0 < 0.01);
    }

    #[test]
    fn post_normalized_and_euler_steps_are_exact() {
        let charges: Arc<[FieldCharge]> = vec![
            FieldCharge::new(DVec2::new(-1.0, 0.3), 1.0, 0.5),
            FieldCharge::new(DVec2::new(2.0, -1.0), -2.0, 0.6),
        ]
        .into();
        for mode in [IntegrationMode::PostNormalized, IntegrationMode::Euler] {
            let start = DVec2::new(0.0, 1.0);
            let mut line = LineIntegrator::new(start, 0.25, mode, charges.clone());
            line.advance();
            let step = (line.position() - start).mag();
            assert!((step - 0.25).abs() < 1e-12, "{:?}: step = {}", mode, step);
        }
    }

    #[test]
    fn line_snaps_onto_negative_charge() {
        let mut line = LineIntegrator::new(
            DVec2::new(1.0, 0.0),
            0.18,
            IntegrationMode::StageNormalized,
            dipole(),
        );
        let mut steps = 0;
        let mut last = Vec2::zero();
        while line.is_continuing() && steps < 100 {
            last = line.advance();
            steps += 1;
        }
        assert!(!line.is_continuing());
        assert_eq!(steps, 6, "x passes 2.0 on the sixth step");
        assert_eq!(last, Vec2::new(3.0, 0.0));
        assert_eq!(line.position(), DVec2::new(3.0, 0.0));

        // Further calls add nothing.
        assert_eq!(line.advance(), last);
        assert_eq!(line.position(), DVec2::new(3.0, 0.0));
    }

    #[test]
    fn start_inside_absorption_radius_stops_immediately() {
        let mut line = LineIntegrator::new(
            DVec2::new(2.5, 0.0),
            0.18,
            IntegrationMode::StageNormalized,
            dipole(),
        );
        let p = line.advance();
        assert!(!line.is_continuing());
        assert_eq!(p, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn positive_charges_never_absorb() {
        let charges: Arc<[FieldCharge]> = vec![
            FieldCharge::new(DVec2::zero(), 1.0, 0.5),
            FieldCharge::new(DVec2::new(1.5, 0.0), 1.0, 0.5),
        ]
        .into();
        let mut line =
            LineIntegrator::new(DVec2::new(0.0, 1.0), 0.18, IntegrationMode::StageNormalized, charges);
        for _ in 0..50 {
            line.advance();
        }
        assert!(line.is_continuing());
    }

    #[test]
    fn stagnation_point_stops_line_in_place() {
        let charges: Arc<[FieldCharge]> = vec![
            FieldCharge::new(DVec2::new(-1.0, 0.0), 1.0, 0.5),
            FieldCharge::new(DVec2::new(1.0, 0.0), 1.0, 0.5),
        ]
        .into();
        let mut line =
            LineIntegrator::new(DVec2::zero(), 0.18, IntegrationMode::StageNormalized, charges);
        let p = line.advance();
        assert!(!line.is_continuing());
        assert_eq!(p, Vec2::zero());
        assert_eq!(line.position(), DVec2::zero());
    }
}

#[cfg(test)]
mod buffer {
    use crate::field::PointBuffer;
    use ultraviolet::Vec2;

    #[test]
    fn seed_points_are_published_immediately() {
        let seed = [Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)];
        let (buffer, _writer) = PointBuffer::with_seed(5, &seed);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.snapshot(), seed.to_vec());
        assert_eq!(buffer.get(2), None);
        assert!(!buffer.is_absorbed());
    }

    #[test]
    fn writer_stops_at_capacity() {
        let (buffer, mut writer) = PointBuffer::with_seed(3, &[Vec2::zero()]);
        assert!(writer.push(Vec2::new(1.0, 0.0)));
        assert!(writer.push(Vec2::new(2.0, 0.0)));
        assert!(writer.is_full());
        assert!(!writer.push(Vec2::new(3.0, 0.0)));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.last(), Some(Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn seed_longer_than_capacity_is_truncated() {
        let (buffer, writer) = PointBuffer::with_seed(1, &[Vec2::zero(), Vec2::one()]);
        assert_eq!(buffer.len(), 1);
        assert!(writer.is_full());
    }

    #[test]
    fn readers_only_see_complete_prefixes() {
        const N: usize = 20_000;
        let (buffer, mut writer) = PointBuffer::with_seed(N, &[]);
        std::thread::scope(|s| {
            s.spawn(move || {
                for i in 0..N {
                    writer.push(Vec2::new(i as f32, -(i as f32)));
                }
                writer.mark_absorbed();
            });
            let mut last_len = 0;
            while !buffer.is_absorbed() {
                let snap = buffer.snapshot();
                assert!(snap.len() >= last_len);
                for (i, p) in snap.iter().enumerate() {
                    assert_eq!(*p, Vec2::new(i as f32, -(i as f32)));
                }
                last_len = snap.len();
            }
        });
        assert_eq!(buffer.len(), N);
    }

    #[test]
    fn absorbed_flag_implies_final_point_visible() {
        let end = Vec2::new(9.0, 9.0);
        for _ in 0..2_000 {
            let (buffer, mut writer) = PointBuffer::with_seed(4, &[Vec2::zero(), Vec2::one()]);
            std::thread::scope(|s| {
                s.spawn(move || {
                    writer.push(end);
                    writer.mark_absorbed();
                });
                loop {
                    // Same order as the line publisher: flag, then points.
                    let absorbed = buffer.is_absorbed();
                    let points = buffer.snapshot();
                    if absorbed {
                        assert_eq!(points.last(), Some(&end));
                        break;
                    }
                    assert!(points.len() >= 2);
                }
            });
        }
    }
}
