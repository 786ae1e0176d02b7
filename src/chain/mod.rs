//! MCMC sample chains: storage-independent access plus concrete readers.
//!
//! A chain is a 3D array `step × walker × parameter`. Generators only talk to
//! the [`ChainReader`] trait, so any storage format can be plugged in.

pub mod json;
pub mod synthetic;

pub use json::*;
pub use synthetic::*;

use std::ops::Range;

use ndarray::{Array3, s};

use crate::error::AppError;

/// Sample chain, `step × walker × parameter`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainArray {
    data: Array3<f64>,
}

impl ChainArray {
    pub fn new(data: Array3<f64>) -> Result<Self, AppError> {
        let (steps, walkers, params) = data.dim();
        if steps == 0 || walkers == 0 || params == 0 {
            return Err(AppError::new(
                3,
                format!("Chain is empty (shape {steps}×{walkers}×{params})."),
            ));
        }
        Ok(Self { data })
    }

    pub fn steps(&self) -> usize {
        self.data.dim().0
    }

    pub fn walkers(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_params(&self) -> usize {
        self.data.dim().2
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.data
    }

    /// All samples of parameter `k` within `steps`, walkers flattened in.
    pub fn flattened(&self, steps: Range<usize>, k: usize) -> Vec<f64> {
        self.data
            .slice(s![steps, .., k])
            .iter()
            .copied()
            .collect()
    }

    /// Trajectory of one walker for parameter `k` within `steps`.
    pub fn walker_trace(&self, steps: Range<usize>, walker: usize, k: usize) -> Vec<f64> {
        self.data.slice(s![steps, walker, k]).to_vec()
    }

    /// Per-parameter means over the whole chain.
    #[cfg(test)]
    pub(crate) fn means(&self) -> Vec<f64> {
        self.data
            .mean_axis(ndarray::Axis(0))
            .and_then(|per_walker| per_walker.mean_axis(ndarray::Axis(0)))
            .map(|m| m.to_vec())
            .unwrap_or_default()
    }
}

/// Read access to a stored chain and its parameter labels.
pub trait ChainReader {
    fn labels(&self) -> Result<Vec<String>, AppError>;
    fn chain(&self) -> Result<ChainArray, AppError>;
}

/// Chain held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryChain {
    labels: Vec<String>,
    chain: ChainArray,
}

impl InMemoryChain {
    pub fn new(labels: Vec<String>, chain: ChainArray) -> Result<Self, AppError> {
        if labels.len() != chain.n_params() {
            return Err(AppError::input(format!(
                "Chain has {} parameters but {} labels.",
                chain.n_params(),
                labels.len()
            )));
        }
        Ok(Self { labels, chain })
    }
}

impl ChainReader for InMemoryChain {
    fn labels(&self) -> Result<Vec<String>, AppError> {
        Ok(self.labels.clone())
    }

    fn chain(&self) -> Result<ChainArray, AppError> {
        Ok(self.chain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ChainArray {
        // value = 100·step + 10·walker + param
        let data = Array3::from_shape_fn((4, 3, 2), |(s, w, p)| (100 * s + 10 * w + p) as f64);
        ChainArray::new(data).unwrap()
    }

    #[test]
    fn flattened_slices_steps_and_keeps_all_walkers() {
        let chain = ramp();
        let v = chain.flattened(1..3, 1);
        assert_eq!(v.len(), 6);
        assert_eq!(v[0], 101.0);
        assert!(v.contains(&221.0));
        assert!(!v.iter().any(|x| *x < 100.0 || *x > 300.0));
    }

    #[test]
    fn walker_trace_follows_steps() {
        let chain = ramp();
        assert_eq!(chain.walker_trace(0..4, 2, 0), vec![20.0, 120.0, 220.0, 320.0]);
        assert_eq!(chain.means(), vec![160.0, 161.0]);
    }

    #[test]
    fn empty_chain_and_label_mismatch_are_rejected() {
        assert_eq!(ChainArray::new(Array3::zeros((0, 2, 2))).unwrap_err().exit_code(), 3);
        assert!(InMemoryChain::new(vec!["a".into()], ramp()).is_err());
    }
}
