//! Read dataset JSON files for the linear fitting engine.
//!
//! Schema: `{ "x": [...], "y": [...], "sigma": [...] }`. When `sigma` is
//! omitted every point gets unit uncertainty.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::Dataset;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct DatasetFile {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default)]
    sigma: Option<Vec<f64>>,
}

/// Read and validate a dataset JSON file.
pub fn read_dataset_json(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open dataset '{}': {e}", path.display())))?;
    let raw: DatasetFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Failed to parse dataset '{}': {e}", path.display())))?;

    let sigma = raw.sigma.unwrap_or_else(|| vec![1.0; raw.x.len()]);
    let data = Dataset {
        x: raw.x,
        y: raw.y,
        sigma,
    };
    data.validate()?;
    info!(path = %path.display(), points = data.len(), "loaded dataset");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_dataset_with_and_without_sigma() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "a.json", r#"{"x": [0, 1], "y": [2, 3], "sigma": [0.5, 0.5]}"#);
        let d = read_dataset_json(&p).unwrap();
        assert_eq!(d.sigma, vec![0.5, 0.5]);

        let p = write(&dir, "b.json", r#"{"x": [0, 1, 2], "y": [2, 3, 4]}"#);
        let d = read_dataset_json(&p).unwrap();
        assert_eq!(d.sigma, vec![1.0; 3]);
    }

    #[test]
    fn invalid_dataset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(&dir, "c.json", r#"{"x": [0, 1], "y": [2]}"#);
        assert_eq!(read_dataset_json(&p).unwrap_err().exit_code(), 2);
        let p = write(&dir, "d.json", "not json");
        assert_eq!(read_dataset_json(&p).unwrap_err().exit_code(), 2);
    }
}
