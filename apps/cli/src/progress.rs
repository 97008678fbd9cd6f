//! Indicatif-backed progress sink for the export pipeline.

use indicatif::{ProgressBar, ProgressStyle};

use bookport_core::{Progress, ProgressSink, Stage};

pub struct ExportProgress {
    bar: ProgressBar,
}

impl ExportProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {wide_msg}")
                .expect("valid progress template"),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ExportProgress {
    fn event(&self, progress: &Progress) {
        // Position reflects completed items; the in-flight item shows as msg.
        if progress.stage == Stage::Done {
            self.bar.set_position(progress.current as u64);
            self.bar.set_message(progress.title.clone());
        } else {
            self.bar
                .set_message(format!("{} — {}", progress.title, progress.stage));
        }
    }
}
