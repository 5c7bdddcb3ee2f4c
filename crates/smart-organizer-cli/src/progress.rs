use indicatif::{ProgressBar, ProgressStyle};
use smart_organizer_core::ProgressReporter;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// One spinner per root, showing the file currently being handled.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    done: Mutex<usize>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            done: Mutex::new(0),
        }
    }

    fn set_message(&self, msg: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(msg);
            }
        }
    }

    fn println(&self, line: String) {
        match self.bar.lock().ok().and_then(|g| g.clone()) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_folder_start(&self, name: &str, path: &Path) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_prefix(name.to_string());
        pb.set_message(format!("{}", path.display()));
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
        if let Ok(mut done) = self.done.lock() {
            *done = 0;
        }
    }

    fn on_file_start(&self, path: &Path) {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.set_message(name);
    }

    fn on_file_done(&self, _from: &Path, _to: &Path, _dry_run: bool) {
        if let Ok(mut done) = self.done.lock() {
            *done += 1;
        }
    }

    fn on_file_failed(&self, path: &Path, error: &str) {
        self.println(format!("  \x1b[31m✗\x1b[0m {}: {}", path.display(), error));
    }

    fn on_folder_complete(&self, name: &str) {
        let done = self.done.lock().map(|d| *d).unwrap_or(0);
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        eprintln!("  \x1b[32m✓\x1b[0m {}: {} files changed", name, done);
    }
}
