//! JSON exports of generator results.
//!
//! Exports are meant to be easy to consume from downstream scripts.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{CredibleInterval, FitSnapshot};
use crate::error::AppError;
use crate::plots::ProfileCurve;

#[derive(Debug, Serialize)]
struct IntervalExport<'a> {
    tool: &'static str,
    generated_at: DateTime<Local>,
    intervals: &'a [CredibleInterval],
}

#[derive(Debug, Serialize)]
struct ProfileRow<'a> {
    label: &'a str,
    values: &'a [f64],
    deviance: &'a [f64],
}

#[derive(Debug, Serialize)]
struct ProfileExport<'a> {
    tool: &'static str,
    generated_at: DateTime<Local>,
    baseline: &'a FitSnapshot,
    profiles: Vec<ProfileRow<'a>>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create JSON export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::input(format!("Failed to write JSON export: {e}")))?;
    Ok(())
}

/// Write credible intervals from a correlation plot.
pub fn write_intervals_json(path: &Path, intervals: &[CredibleInterval]) -> Result<(), AppError> {
    write_json(
        path,
        &IntervalExport {
            tool: "fitplot",
            generated_at: Local::now(),
            intervals,
        },
    )
}

/// Write the baseline fit and the 1D profiles of a chi-square map.
pub fn write_profiles_json(path: &Path, baseline: &FitSnapshot, profiles: &[ProfileCurve]) -> Result<(), AppError> {
    let rows = profiles
        .iter()
        .map(|p| ProfileRow {
            label: &p.label,
            values: &p.values,
            deviance: &p.deviance,
        })
        .collect();
    write_json(
        path,
        &ProfileExport {
            tool: "fitplot",
            generated_at: Local::now(),
            baseline,
            profiles: rows,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_export_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intervals.json");
        let rows = vec![CredibleInterval {
            label: "m a".into(),
            q16: -1.0,
            q50: 0.0,
            q84: 1.0,
            bins: 20,
            min: -4.0,
            max: 4.0,
        }];
        write_intervals_json(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["tool"], "fitplot");
        assert_eq!(v["intervals"][0]["label"], "m a");
        assert_eq!(v["intervals"][0]["bins"], 20);
    }
}
