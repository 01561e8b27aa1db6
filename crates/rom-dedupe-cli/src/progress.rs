use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rom_dedupe_core::ProgressReporter;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using an indicatif bar per apply or restore.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl CliReporter {
    pub fn new(hidden: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            hidden,
        }
    }

    fn start_bar(&self, total: usize, verb: &str) {
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        let template = format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} files",
            verb
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));

        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn tick(&self) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            pb.inc(1);
        }
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_apply_start(&self, total_files: usize) {
        self.start_bar(total_files, "Removing");
    }

    fn on_file_removed(&self, _original: &Path, _staged: Option<&Path>) {
        self.tick();
    }

    fn on_apply_complete(&self, files: usize, _bytes: u64) {
        self.finish_bar();
        if !self.hidden {
            eprintln!("  {} Apply complete: {} files", "✓".green(), files);
        }
    }

    fn on_restore_start(&self, total_records: usize) {
        self.start_bar(total_records, "Restoring");
    }

    fn on_file_restored(&self, _original: &Path) {
        self.tick();
    }

    fn on_restore_complete(&self, restored: usize, unresolved: usize) {
        self.finish_bar();
        if !self.hidden {
            eprintln!(
                "  {} Restore complete: {} files, {} left in staging",
                "✓".green(),
                restored,
                unresolved
            );
        }
    }
}
