use fieldlines::config::{ChargeStyle, EvalParams};
use fieldlines::{ChargeSpec, LineEvaluator};
use serde::Serialize;
use std::{env, time::Duration, time::Instant};

#[derive(Serialize)]
struct ProbeRun {
    workers: usize,
    wall_time_micros: u128,
    lines: usize,
    points: usize,
    absorbed: usize,
    points_per_second: f64,
}

#[derive(Serialize)]
struct RuntimeReport {
    charges: usize,
    seed: u64,
    max_points: usize,
    runs: Vec<ProbeRun>,
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    for window in args.windows(2) {
        if window[0] == flag {
            return window[1].parse().unwrap_or(default);
        }
    }

    let prefix = format!("{}=", flag);
    for arg in args {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return value.parse().unwrap_or(default);
        }
    }

    default
}

fn build_scene(charges: usize, seed: u64) -> Vec<ChargeSpec> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..charges)
        .map(|_| {
            let magnitude = 1.0 + rng.f64() * 3.0;
            let sign = if rng.bool() { 1.0 } else { -1.0 };
            ChargeSpec::new(rng.f64() * 60.0 - 30.0, rng.f64() * 60.0 - 30.0, sign * magnitude)
        })
        .collect()
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let charges = parse_arg(&args, "--charges", 40);
    let seed = parse_arg(&args, "--seed", 1) as u64;
    let max_points = parse_arg(&args, "--max-points", 2_000);
    let max_workers = parse_arg(&args, "--max-workers", fieldlines::pool::available_parallelism()).max(1);

    let scene = build_scene(charges, seed);
    let mut runs = Vec::new();
    let mut workers = 1;
    while workers <= max_workers {
        let params = EvalParams {
            max_points_per_line: max_points,
            workers: Some(workers),
            ..EvalParams::default()
        };
        let mut evaluator = LineEvaluator::new(params, ChargeStyle::default());

        let start = Instant::now();
        evaluator.set_charges(scene.clone());
        let settled = evaluator.wait_settled(Duration::from_secs(600));
        let wall = start.elapsed();
        if !settled {
            eprintln!("workers={} did not settle", workers);
        }

        let lines = evaluator.lines();
        let points: usize = lines.iter().map(|l| l.points.len()).sum();
        runs.push(ProbeRun {
            workers,
            wall_time_micros: wall.as_micros(),
            lines: lines.len(),
            points,
            absorbed: lines.iter().filter(|l| l.absorbed).count(),
            points_per_second: points as f64 / wall.as_secs_f64().max(1e-9),
        });
        workers *= 2;
    }

    let report = RuntimeReport {
        charges,
        seed,
        max_points,
        runs,
    };
    match serde_json::to_string(&report) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("failed to serialize runtime report: {}", err),
    }
}
