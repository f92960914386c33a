use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use fieldlines::app::{self, state::FieldCommand, LoopExit, LoopOptions};
use fieldlines::config::{EvalConfig, IntegrationMode, EVAL_CONFIG};
use fieldlines::init_config::InitConfig;
use fieldlines::{io, LineEvaluator};
use tracing_subscriber::EnvFilter;

/// Computes the electric field lines of a set of point charges.
#[derive(Parser, Debug)]
#[command(name = "fieldlines")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Startup TOML file with [eval], [style] and [[charges]] tables (default: ./fieldlines.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scene file to load (count line, then "charge=<m> coord=<x>, <y>" lines)
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Lines per unit of positive charge
    #[arg(long)]
    lines_per_charge: Option<f64>,

    /// Arc length of one integration step
    #[arg(long)]
    step_length: Option<f64>,

    /// Point budget of every line
    #[arg(long)]
    max_points: Option<usize>,

    /// stage_normalized, post_normalized, force_scaled or euler
    #[arg(long)]
    mode: Option<IntegrationMode>,

    /// Worker threads (default: available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Give up waiting for the lines after this many milliseconds
    #[arg(long, default_value = "60000")]
    timeout_ms: u64,

    /// Save the scene here once computed
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write charges and lines as JSON here once computed
    #[arg(long)]
    export: Option<PathBuf>,
}

fn load_init_config(path: Option<&PathBuf>) -> anyhow::Result<InitConfig> {
    let config = match path {
        Some(path) => Some(InitConfig::load_from_file(path)?),
        None => InitConfig::load_default()?,
    };
    Ok(config.unwrap_or_default())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let init = load_init_config(cli.config.as_ref()).context("loading startup config")?;

    let mut params = init.eval;
    if let Some(v) = cli.lines_per_charge {
        params.lines_per_charge = v;
    }
    if let Some(v) = cli.step_length {
        params.step_length = v;
    }
    if let Some(v) = cli.max_points {
        params.max_points_per_line = v;
    }
    if let Some(v) = cli.mode {
        params.mode = v;
    }
    if cli.workers.is_some() {
        params.workers = cli.workers;
    }
    let params = params.clamped();

    *EVAL_CONFIG.lock() = EvalConfig {
        eval: params,
        style: init.style,
        config_version: 0,
    };

    let mut startup = Vec::new();
    if let Some(path) = cli.scene.clone().or(init.scene) {
        startup.push(FieldCommand::LoadScene { path, append: false });
    }
    if !init.charges.is_empty() {
        startup.push(FieldCommand::SetCharges {
            charges: init.charges,
            append: true,
        });
    }

    let options = LoopOptions {
        exit_when_settled: true,
        timeout: Some(Duration::from_millis(cli.timeout_ms)),
    };
    let evaluator = {
        let live = EVAL_CONFIG.lock();
        LineEvaluator::new(live.draft(), live.style)
    };
    let (evaluator, exit) = app::run(evaluator, startup, options)?;
    if exit == LoopExit::TimedOut {
        tracing::warn!(timeout_ms = cli.timeout_ms, "lines still growing, writing partial results");
    }

    let lines = evaluator.lines();
    let absorbed = lines.iter().filter(|l| l.absorbed).count();
    tracing::info!(
        charges = evaluator.charges().len(),
        lines = lines.len(),
        absorbed,
        points = lines.iter().map(|l| l.points.len()).sum::<usize>(),
        "evaluation finished"
    );

    if let Some(path) = &cli.save {
        let specs = evaluator.charges().specs();
        if specs.is_empty() {
            tracing::info!("empty scene, nothing saved");
        } else {
            io::save_scene(path, &specs).with_context(|| format!("saving {}", path.display()))?;
        }
    }
    if let Some(path) = &cli.export {
        io::export_lines(path, &evaluator.charge_views(), &lines)
            .with_context(|| format!("exporting {}", path.display()))?;
    }
    Ok(())
}
