// Progress reporting hook for long-running phases.
//
// Snapshot building and batch classification report through this trait so
// the core never touches the terminal. The CLI plugs in an indicatif bar;
// library callers and tests use NoopProgress.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress events for one phase at a time.
pub trait ProgressReporter: Send + Sync {
    /// A new phase begins with `total` units of work.
    fn start(&self, phase: &str, total: usize);

    /// `done` units of the current phase have completed.
    fn advance(&self, done: usize);

    /// The current phase is over.
    fn finish(&self);
}

/// Reporter that ignores every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _phase: &str, _total: usize) {}
    fn advance(&self, _done: usize) {}
    fn finish(&self) {}
}

/// Terminal progress bar, one bar per phase.
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, phase: &str, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {msg:<24} [{bar:30}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(phase.to_string());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, done: usize) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(pb) = slot.as_ref() {
                pb.set_position(done as u64);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}
