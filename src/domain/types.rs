//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - passed between the fitting engine and the plot generators
//! - captured as immutable snapshots and restored later
//! - exported to JSON for downstream scripts

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Delimiter between the components of a hierarchical parameter label.
pub const NAME_DELIMITER: &str = "___";

/// Hierarchical parameter name: `source___model___variable`.
///
/// Parsed once when labels are loaded. Labels with fewer than three parts are
/// filled from the right, so the last part is always the variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamName {
    pub source: String,
    pub model: String,
    pub variable: String,
}

impl ParamName {
    pub fn new(source: impl Into<String>, model: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            model: model.into(),
            variable: variable.into(),
        }
    }

    pub fn parse(label: &str) -> Self {
        let mut parts: Vec<&str> = label.split(NAME_DELIMITER).collect();
        let variable = parts.pop().unwrap_or_default().to_string();
        let model = parts.pop().unwrap_or_default().to_string();
        // Anything left in front belongs to the source, including stray delimiters.
        let source = parts.join(NAME_DELIMITER);
        Self {
            source,
            model,
            variable,
        }
    }

    /// Full label as stored by the fitting engine and chain files.
    pub fn label(&self) -> String {
        format!(
            "{}{NAME_DELIMITER}{}{NAME_DELIMITER}{}",
            self.source, self.model, self.variable
        )
    }

    /// Human-readable label for plot titles and axes.
    pub fn display(&self, style: LabelStyle) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if style.source && !self.source.is_empty() {
            parts.push(&self.source);
        }
        if style.model && !self.model.is_empty() {
            parts.push(&self.model);
        }
        parts.push(&self.variable);
        parts.join(" ")
    }
}

/// Which components of a [`ParamName`] appear in display labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub source: bool,
    pub model: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            source: false,
            model: true,
        }
    }
}

/// A single fit parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: ParamName,
    pub value: f64,
    pub vary: bool,
    pub stderr: Option<f64>,
}

impl Parameter {
    pub fn new(name: ParamName, value: f64) -> Self {
        Self {
            name,
            value,
            vary: true,
            stderr: None,
        }
    }

    /// Standard error used to size sweeps.
    ///
    /// Falls back to 1% of `|value|` when the error is missing or zero, and to
    /// `0.01` when the value itself is zero.
    pub fn sweep_stderr(&self) -> f64 {
        match self.stderr {
            Some(e) if e.is_finite() && e != 0.0 => e.abs(),
            _ => {
                let fallback = 0.01 * self.value.abs();
                if fallback > 0.0 && fallback.is_finite() {
                    fallback
                } else {
                    0.01
                }
            }
        }
    }

    /// `[value - 3·stderr, value + 3·stderr]`.
    pub fn swept_range(&self) -> SweptRange {
        let stderr = self.sweep_stderr();
        SweptRange {
            center: self.value,
            stderr,
            low: self.value - 3.0 * stderr,
            high: self.value + 3.0 * stderr,
        }
    }
}

/// Ordered parameter collection, looked up by full label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    params: Vec<Parameter>,
}

impl ParamSet {
    pub fn new(params: Vec<Parameter>) -> Self {
        Self { params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, label: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name.label() == label)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name.label() == label)
    }

    pub fn by_index(&self, idx: usize) -> Option<&Parameter> {
        self.params.get(idx)
    }

    pub fn by_index_mut(&mut self, idx: usize) -> Option<&mut Parameter> {
        self.params.get_mut(idx)
    }

    /// Fix a parameter at `value`.
    pub fn pin(&mut self, label: &str, value: f64) -> Result<(), AppError> {
        let p = self
            .get_mut(label)
            .ok_or_else(|| AppError::input(format!("Unknown parameter '{label}'.")))?;
        p.vary = false;
        p.value = value;
        Ok(())
    }

    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }
}

/// Deviance scalars reported by a fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub chisqr: Option<f64>,
    /// Negative log-likelihood, only reported when requested.
    pub llh: Option<f64>,
}

/// Immutable capture of the engine state at one point in parameter space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSnapshot {
    pub params: ParamSet,
    pub summary: FitSummary,
}

/// Axis bounds of a parameter sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweptRange {
    pub center: f64,
    pub stderr: f64,
    pub low: f64,
    pub high: f64,
}

impl SweptRange {
    /// `n` evenly spaced points from `low` to `high` inclusive.
    pub fn linspace(&self, n: usize) -> Vec<f64> {
        linspace(self.low, self.high, n)
    }
}

/// Which deviance the profile generator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevianceKind {
    ChiSquare,
    LogLikelihood,
}

impl DevianceKind {
    pub fn axis_label(self) -> &'static str {
        match self {
            DevianceKind::ChiSquare => "Δχ²",
            DevianceKind::LogLikelihood => "ΔL",
        }
    }
}

/// Percentage window over chain steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub start: f64,
    pub end: f64,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 100.0,
        }
    }
}

impl Selection {
    pub fn new(start: f64, end: f64) -> Result<Self, AppError> {
        let sel = Self { start, end };
        sel.validate()?;
        Ok(sel)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.start.is_finite() && self.end.is_finite())
            || self.start < 0.0
            || self.end > 100.0
            || self.start >= self.end
        {
            return Err(AppError::input(format!(
                "Invalid selection window ({}, {}): need 0 <= start < end <= 100.",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Step indices `first..last` covered by the window.
    pub fn step_range(&self, len: usize) -> Result<std::ops::Range<usize>, AppError> {
        self.validate()?;
        let first = (len as f64 / 100.0 * self.start).floor() as usize;
        let last = ((len as f64 / 100.0 * self.end).ceil() as usize).min(len);
        if first >= last {
            return Err(AppError::new(
                3,
                format!("Selection ({}, {}) covers no steps of a chain with {len} steps.", self.start, self.end),
            ));
        }
        Ok(first..last)
    }
}

/// Percentile-based credible interval for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibleInterval {
    pub label: String,
    pub q16: f64,
    pub q50: f64,
    pub q84: f64,
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl CredibleInterval {
    pub fn minus(&self) -> f64 {
        (self.q50 - self.q16).abs()
    }

    pub fn plus(&self) -> f64 {
        (self.q84 - self.q50).abs()
    }
}

/// Observations for the linear fitting engine: `y(x) ± sigma`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.x.is_empty() {
            return Err(AppError::new(3, "Dataset has no points."));
        }
        if self.y.len() != self.x.len() || self.sigma.len() != self.x.len() {
            return Err(AppError::input(format!(
                "Dataset arrays differ in length: x={}, y={}, sigma={}.",
                self.x.len(),
                self.y.len(),
                self.sigma.len()
            )));
        }
        if self.x.iter().chain(&self.y).any(|v| !v.is_finite()) {
            return Err(AppError::input("Dataset contains non-finite x or y values."));
        }
        if self.sigma.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(AppError::input("Every sigma must be finite and > 0."));
        }
        Ok(())
    }
}

/// `n` evenly spaced points over `[low, high]` (numpy `linspace` semantics).
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i == n - 1 { high } else { low + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_name_parses_three_parts() {
        let name = ParamName::parse("scan1___gauss___mu");
        assert_eq!(name, ParamName::new("scan1", "gauss", "mu"));
        assert_eq!(name.label(), "scan1___gauss___mu");
    }

    #[test]
    fn param_name_fills_from_the_right() {
        let name = ParamName::parse("amplitude");
        assert_eq!(name.variable, "amplitude");
        assert!(name.model.is_empty());
        assert!(name.source.is_empty());
        assert_eq!(name.display(LabelStyle::default()), "amplitude");
    }

    #[test]
    fn display_respects_style() {
        let name = ParamName::new("src", "lorentz", "fwhm");
        assert_eq!(name.display(LabelStyle::default()), "lorentz fwhm");
        assert_eq!(
            name.display(LabelStyle { source: true, model: true }),
            "src lorentz fwhm"
        );
        assert_eq!(name.display(LabelStyle { source: false, model: false }), "fwhm");
    }

    #[test]
    fn sweep_stderr_fallbacks() {
        let mut p = Parameter::new(ParamName::parse("a___b___c"), 200.0);
        assert!((p.sweep_stderr() - 2.0).abs() < 1e-12);
        p.stderr = Some(0.0);
        assert!((p.sweep_stderr() - 2.0).abs() < 1e-12);
        p.stderr = Some(0.5);
        assert!((p.sweep_stderr() - 0.5).abs() < 1e-12);
        p.value = 0.0;
        p.stderr = None;
        assert!(p.sweep_stderr() > 0.0);

        let r = Parameter { stderr: Some(0.5), value: 10.0, ..p }.swept_range();
        assert!((r.low - 8.5).abs() < 1e-12);
        assert!((r.high - 11.5).abs() < 1e-12);
    }

    #[test]
    fn selection_step_range_matches_floor_ceil() {
        let sel = Selection::new(10.0, 55.0).unwrap();
        assert_eq!(sel.step_range(1000).unwrap(), 100..550);
        let sel = Selection::new(33.3, 66.6).unwrap();
        assert_eq!(sel.step_range(10).unwrap(), 3..7);
        assert!(Selection::new(50.0, 50.0).is_err());
        assert!(Selection::new(-1.0, 50.0).is_err());
    }

    #[test]
    fn dataset_validation() {
        let ok = Dataset {
            x: vec![0.0, 1.0],
            y: vec![1.0, 2.0],
            sigma: vec![0.1, 0.1],
        };
        assert!(ok.validate().is_ok());
        let bad = Dataset {
            sigma: vec![0.1, 0.0],
            ..ok.clone()
        };
        assert_eq!(bad.validate().unwrap_err().exit_code(), 2);
        let short = Dataset { y: vec![1.0], ..ok };
        assert!(short.validate().is_err());
    }

    #[test]
    fn linspace_hits_endpoints() {
        let v = linspace(-1.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], -1.0);
        assert_eq!(v[4], 1.0);
        assert!((v[2]).abs() < 1e-15);
    }
}
