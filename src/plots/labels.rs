//! Titles and axis labels shared by the plot generators.
//!
//! Values with uncertainties are printed with two significant digits in the
//! uncertainty and the value rounded to the same decimal place. Very large
//! or very small values are factored as `(v -a +b)e<exp>`.

use crate::domain::{LabelStyle, ParamName};

/// Display labels for raw hierarchical labels.
pub fn display_labels(labels: &[String], style: LabelStyle) -> Vec<String> {
    labels
        .iter()
        .map(|l| ParamName::parse(l).display(style))
        .collect()
}

/// Indices of the labels matching any filter substring.
///
/// Filters are applied in order; each contributes every label containing it.
/// A label matched by several filters is kept once, at its first position.
/// Without filters every label is selected.
pub fn select_by_filter(labels: &[String], filter: Option<&[String]>) -> Vec<usize> {
    let Some(filter) = filter else {
        return (0..labels.len()).collect();
    };
    let mut picked: Vec<usize> = Vec::new();
    for f in filter {
        for (idx, label) in labels.iter().enumerate() {
            if label.contains(f.as_str()) && !picked.contains(&idx) {
                picked.push(idx);
            }
        }
    }
    picked
}

/// `name` followed by `value -minus +plus`.
pub fn interval_title(name: &str, value: f64, minus: f64, plus: f64) -> String {
    format!("{name}: {}", format_interval(value, minus, plus))
}

/// Asymmetric interval with value precision set by `plus`.
pub fn format_interval(value: f64, minus: f64, plus: f64) -> String {
    let reference = if plus.is_finite() && plus > 0.0 { plus } else { minus };
    if !(reference.is_finite() && reference > 0.0) || !value.is_finite() {
        return format!("{value:.4} -0 +0");
    }

    let magnitude = if value != 0.0 { value.abs().max(reference) } else { reference };
    let exp = magnitude.log10().floor() as i32;
    let exp = if !(-5..6).contains(&exp) { exp } else { 0 };
    let scale = 10f64.powi(exp);

    let (v, m, p) = (value / scale, minus / scale, plus / scale);
    let body = format!(
        "{} -{} +{}",
        round_to_place(v, significant_place(reference / scale)),
        two_significant(m),
        two_significant(p)
    );
    if exp == 0 {
        body
    } else {
        format!("({body})e{exp}")
    }
}

/// Decimal place `10^place` that keeps two significant digits of `u > 0`,
/// taken after rounding so `0.0996` counts as `0.10`.
fn significant_place(u: f64) -> i32 {
    let place = u.log10().floor() as i32 - 1;
    let q = 10f64.powi(place);
    if (u / q).round() >= 100.0 { place + 1 } else { place }
}

/// Round `v` to the decimal place `10^place` and print it without noise.
fn round_to_place(v: f64, place: i32) -> String {
    if place >= 0 {
        let q = 10f64.powi(place);
        format!("{:.0}", (v / q).round() * q)
    } else {
        format!("{:.*}", (-place) as usize, v)
    }
}

fn two_significant(u: f64) -> String {
    if !(u.is_finite() && u > 0.0) {
        return "0".to_string();
    }
    round_to_place(u, significant_place(u))
}
