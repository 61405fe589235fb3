//! Progress bar for batch runs.

use std::io::{self, IsTerminal};

use indicatif::{ProgressBar, ProgressStyle};

/// Creates the batch progress bar on stderr.
///
/// The bar is hidden when `enabled` is false or stderr is not a terminal, so
/// logs and piped runs stay clean.
pub(crate) fn batch_progress(total: usize, enabled: bool) -> ProgressBar {
    if !enabled || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
