//! Formatted terminal output.
//!
//! Formatting code lives in one place so:
//! - the generators stay free of presentation details
//! - output changes are localized

use chrono::{DateTime, Local};

use crate::domain::{CredibleInterval, ParamSet};
use crate::fit::FitInfo;
use crate::report::Residual;

/// One-line banner with the command name and the generation time.
pub fn format_header(command: &str, generated_at: DateTime<Local>) -> String {
    format!(
        "=== fitplot {command} | {} ===\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Credible-interval table (one row per parameter).
pub fn format_interval_table(intervals: &[CredibleInterval]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        format!(
            "{:<28} {:>14} {:>12} {:>12} {:>6}",
            "parameter", "median", "-1σ", "+1σ", "bins"
        ),
    );
    push_row(
        &mut out,
        format!("{:-<28} {:-<14} {:-<12} {:-<12} {:-<6}", "", "", "", "", ""),
    );
    for c in intervals {
        push_row(
            &mut out,
            format!(
                "{:<28} {:>14} {:>12} {:>12} {:>6}",
                truncate(&c.label, 28),
                fmt_num(c.q50),
                fmt_num(c.minus()),
                fmt_num(c.plus()),
                c.bins
            ),
        );
    }
    out
}

/// Parameter table plus goodness-of-fit line.
pub fn format_param_table(params: &ParamSet, info: Option<FitInfo>) -> String {
    let mut out = String::new();
    if let Some(info) = info {
        out.push_str(&format!(
            "chisqr={:.4} redchi={:.4} ndata={} nvarys={}\n\n",
            info.chisqr, info.redchi, info.ndata, info.nvarys
        ));
    }
    push_row(
        &mut out,
        format!("{:<28} {:>14} {:>14} {:<5}", "parameter", "value", "stderr", "vary"),
    );
    push_row(&mut out, format!("{:-<28} {:-<14} {:-<14} {:-<5}", "", "", "", ""));
    for p in params.iter() {
        push_row(
            &mut out,
            format!(
                "{:<28} {:>14} {:>14} {:<5}",
                truncate(&p.name.label(), 28),
                fmt_num(p.value),
                p.stderr.map(fmt_num).unwrap_or_else(|| "-".to_string()),
                p.vary
            ),
        );
    }
    out
}

/// Largest pulls of a fit.
pub fn format_pull_table(residuals: &[Residual]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        format!("{:>12} {:>14} {:>14} {:>8}", "x", "y_obs", "y_fit", "pull"),
    );
    push_row(&mut out, format!("{:-<12} {:-<14} {:-<14} {:-<8}", "", "", "", ""));
    for r in residuals {
        push_row(
            &mut out,
            format!(
                "{:>12} {:>14} {:>14} {:>8.2}",
                fmt_num(r.x),
                fmt_num(r.y_obs),
                fmt_num(r.y_fit),
                r.pull
            ),
        );
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-4..1e6).contains(&a) {
        format!("{v:.4e}")
    } else {
        format!("{v:.6}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
