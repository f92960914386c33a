// io.rs
// Scene files (count line then one "charge=<m> coord=<x>, <y>" line per charge) and JSON line export

use crate::charge::{ChargeSpec, ChargeView};
use crate::config::{ChargeStyle, SCENE_MAX_CHARGES};
use crate::evaluator::PolyLine;
use crate::profile_scope;
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("scene file does not start with a charge count")]
    MissingCount,
    #[error("scene declares {0} charges, the limit is {max}", max = SCENE_MAX_CHARGES - 1)]
    TooManyCharges(usize),
    #[error("line {line}: cannot read a charge from {text:?}")]
    BadLine { line: usize, text: String },
    #[error("scene declares {expected} charges but only {found} follow")]
    Truncated { expected: usize, found: usize },
}

/// Parse a whole scene. Nothing is returned unless every declared charge
/// parsed; magnitudes are raised to the style minimum keeping their sign.
pub fn parse_scene(text: &str, style: &ChargeStyle) -> Result<Vec<ChargeSpec>, SceneError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let count: usize = lines
        .next()
        .and_then(|(_, l)| l.parse().ok())
        .ok_or(SceneError::MissingCount)?;
    if count >= SCENE_MAX_CHARGES {
        return Err(SceneError::TooManyCharges(count));
    }

    let mut specs = Vec::with_capacity(count);
    for (line, text) in lines.take(count) {
        let mut spec = parse_charge_line(text).ok_or_else(|| SceneError::BadLine {
            line,
            text: text.to_string(),
        })?;
        spec.magnitude = style.clamp_magnitude(spec.magnitude);
        specs.push(spec);
    }
    if specs.len() < count {
        return Err(SceneError::Truncated {
            expected: count,
            found: specs.len(),
        });
    }
    Ok(specs)
}

fn parse_charge_line(text: &str) -> Option<ChargeSpec> {
    let rest = text.strip_prefix("charge=")?;
    let (magnitude, coords) = rest.split_once("coord=")?;
    let (x, y) = coords.split_once(',')?;
    let spec = ChargeSpec::new(
        x.trim().parse().ok()?,
        y.trim().parse().ok()?,
        magnitude.trim().parse().ok()?,
    );
    (spec.x.is_finite() && spec.y.is_finite() && spec.magnitude.is_finite()).then_some(spec)
}

pub fn format_scene(specs: &[ChargeSpec]) -> String {
    let mut out = format!("{}\n", specs.len());
    for spec in specs {
        out.push_str(&format!("charge={} coord={}, {}\n", spec.magnitude, spec.x, spec.y));
    }
    out
}

pub fn load_scene<P: AsRef<Path>>(path: P, style: &ChargeStyle) -> Result<Vec<ChargeSpec>, SceneError> {
    profile_scope!("load_scene");
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_scene(&text, style)
}

/// Write the scene next to its target and rename it into place.
pub fn save_scene<P: AsRef<Path>>(path: P, specs: &[ChargeSpec]) -> std::io::Result<()> {
    profile_scope!("save_scene");
    write_atomically(path.as_ref(), |w| w.write_all(format_scene(specs).as_bytes()))
}

#[derive(Serialize)]
struct LineExport<'a> {
    charges: &'a [ChargeView],
    lines: &'a [PolyLine],
}

/// Dump the charges and their computed lines as JSON.
pub fn export_lines<P: AsRef<Path>>(
    path: P,
    charges: &[ChargeView],
    lines: &[PolyLine],
) -> std::io::Result<()> {
    profile_scope!("export_lines");
    write_atomically(path.as_ref(), |w| {
        serde_json::to_writer(w, &LineExport { charges, lines })
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    })
}

fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<std::fs::File>) -> std::io::Result<()>,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = tmp_path_for(path);
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_every_charge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.txt");
        let specs = vec![
            ChargeSpec::new(0.0, 0.0, 1.0),
            ChargeSpec::new(-3.25, 7.5, -2.75),
            ChargeSpec::new(1e-3, 123456.789, 4.0),
        ];
        save_scene(&path, &specs).unwrap();
        let loaded = load_scene(&path, &ChargeStyle::default()).unwrap();
        assert_eq!(loaded, specs);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn small_magnitudes_are_clamped_on_load() {
        let text = "2\ncharge=0.01 coord=1, 2\ncharge=-0.5 coord=0, 0\n";
        let specs = parse_scene(text, &ChargeStyle::default()).unwrap();
        assert_eq!(specs[0].magnitude, 1.0);
        assert_eq!(specs[1].magnitude, -1.0);
        assert_eq!((specs[0].x, specs[0].y), (1.0, 2.0));
    }

    #[test]
    fn format_matches_scene_layout() {
        let text = format_scene(&[ChargeSpec::new(1.5, -2.0, -3.0)]);
        assert_eq!(text, "1\ncharge=-3 coord=1.5, -2\n");
    }

    #[test]
    fn malformed_scenes_are_rejected() {
        let style = ChargeStyle::default();
        assert!(matches!(parse_scene("", &style), Err(SceneError::MissingCount)));
        assert!(matches!(parse_scene("two\n", &style), Err(SceneError::MissingCount)));
        assert!(matches!(
            parse_scene("2000\n", &style),
            Err(SceneError::TooManyCharges(2000))
        ));
        assert!(matches!(
            parse_scene("2\ncharge=1 coord=0, 0\n", &style),
            Err(SceneError::Truncated { expected: 2, found: 1 })
        ));
        assert!(matches!(
            parse_scene("1\ncharge=1 coord=0 0\n", &style),
            Err(SceneError::BadLine { line: 2, .. })
        ));
        assert!(matches!(
            parse_scene("1\ncharge=NaN coord=0, 0\n", &style),
            Err(SceneError::BadLine { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scene(dir.path().join("absent.txt"), &ChargeStyle::default()).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("lines.json");
        export_lines(&path, &[], &[]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["charges"].as_array().unwrap().is_empty());
        assert!(value["lines"].as_array().unwrap().is_empty());
    }
}
