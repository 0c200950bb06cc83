//! Progress bar for byte exchanges, fed by the per-chunk observer.

use indicatif::{ProgressBar, ProgressStyle};
use xmv::ChunkProgress;

pub struct ExchangeProgress {
    bar: Option<ProgressBar>,
}

impl ExchangeProgress {
    /// A hidden bar when `enabled` is false or stderr is not a terminal.
    pub fn new(enabled: bool) -> Self {
        let bar = (enabled && atty::is(atty::Stream::Stderr)).then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
            bar.set_style(style);
            bar
        });
        Self { bar }
    }

    pub fn observe(&mut self, p: ChunkProgress) {
        if let Some(bar) = &self.bar {
            if bar.length() != Some(p.bytes_total) {
                bar.set_length(p.bytes_total);
            }
            bar.set_position(p.bytes_done);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
