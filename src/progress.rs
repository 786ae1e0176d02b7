//! Progress reporting for long sweeps.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for `total` units of work; hidden when `enabled` is false.
pub fn work_bar(total: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg:<28} [{bar:30}] {pos}/{len} ({eta})") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
