//! Read/write chain JSON files.
//!
//! Schema:
//!
//! ```json
//! { "labels": ["src___model___a", ...], "chain": [[[a, b, ...], ...], ...] }
//! ```
//!
//! `chain` is nested `step → walker → parameter`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::{ChainArray, ChainReader};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct ChainDocument {
    labels: Vec<String>,
    chain: Vec<Vec<Vec<f64>>>,
}

/// Chain file loaded and validated once on open.
#[derive(Debug, Clone)]
pub struct JsonChainFile {
    labels: Vec<String>,
    chain: ChainArray,
}

impl JsonChainFile {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open chain file '{}': {e}", path.display())))?;
        let doc: ChainDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::input(format!("Failed to parse chain file '{}': {e}", path.display())))?;

        let chain = to_array(&doc.chain, doc.labels.len())
            .map_err(|msg| AppError::input(format!("Malformed chain file '{}': {msg}", path.display())))?;
        let chain = ChainArray::new(chain)?;
        info!(
            path = %path.display(),
            steps = chain.steps(),
            walkers = chain.walkers(),
            params = chain.n_params(),
            "loaded chain"
        );
        Ok(Self {
            labels: doc.labels,
            chain,
        })
    }
}

impl ChainReader for JsonChainFile {
    fn labels(&self) -> Result<Vec<String>, AppError> {
        Ok(self.labels.clone())
    }

    fn chain(&self) -> Result<ChainArray, AppError> {
        Ok(self.chain.clone())
    }
}

fn to_array(nested: &[Vec<Vec<f64>>], n_labels: usize) -> Result<Array3<f64>, String> {
    let steps = nested.len();
    let walkers = nested.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(steps * walkers * n_labels);
    for (s, step) in nested.iter().enumerate() {
        if step.len() != walkers {
            return Err(format!("step {s} has {} walkers, expected {walkers}", step.len()));
        }
        for (w, sample) in step.iter().enumerate() {
            if sample.len() != n_labels {
                return Err(format!(
                    "step {s}, walker {w} has {} values for {n_labels} labels",
                    sample.len()
                ));
            }
            flat.extend_from_slice(sample);
        }
    }
    Array3::from_shape_vec((steps, walkers, n_labels), flat).map_err(|e| e.to_string())
}

/// Write a chain JSON file readable by [`JsonChainFile::open`].
pub fn write_chain_json(path: &Path, labels: &[String], chain: &ChainArray) -> Result<(), AppError> {
    if labels.len() != chain.n_params() {
        return Err(AppError::input(format!(
            "Chain has {} parameters but {} labels.",
            chain.n_params(),
            labels.len()
        )));
    }
    let nested: Vec<Vec<Vec<f64>>> = chain
        .as_array()
        .outer_iter()
        .map(|step| step.outer_iter().map(|walker| walker.to_vec()).collect())
        .collect();
    let doc = ChainDocument {
        labels: labels.to_vec(),
        chain: nested,
    };

    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create chain file '{}': {e}", path.display())))?;
    serde_json::to_writer(BufWriter::new(file), &doc)
        .map_err(|e| AppError::input(format!("Failed to write chain file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn write_then_open_preserves_shape_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let data = Array3::from_shape_fn((5, 2, 3), |(s, w, p)| s as f64 + 0.1 * w as f64 + 0.01 * p as f64);
        let chain = ChainArray::new(data).unwrap();
        let labels: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        write_chain_json(&path, &labels, &chain).unwrap();

        let file = JsonChainFile::open(&path).unwrap();
        assert_eq!(file.labels().unwrap(), labels);
        let back = file.chain().unwrap();
        assert_eq!(back, chain);
    }

    #[test]
    fn ragged_chain_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut f = File::create(&path).unwrap();
        write!(f, r#"{{"labels": ["a", "b"], "chain": [[[1.0, 2.0]], [[1.0]]]}}"#).unwrap();
        drop(f);
        let err = JsonChainFile::open(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("walker 0"));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = JsonChainFile::open(Path::new("/nonexistent/chain.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
