use crate::obfuscator::report::format_duration;
use crate::obfuscator::ObfuscationProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Hands out terminal progress bars, or hidden ones when progress display
/// is off (quiet, JSON or plain output).
pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// One tick per obfuscated file.
    pub fn create_file_progress(&self, total_files: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total_files).with_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Obfuscating files...");
        pb.enable_steady_tick(TICK);
        pb
    }

    /// Spinner shown while the input tree is walked.
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(TICK);
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Moves the bar to the processed count and names the last file written.
pub fn update_file_progress(pb: &ProgressBar, progress: &ObfuscationProgress) {
    pb.set_position(progress.files_processed as u64);

    let Some(current_file) = &progress.current_file else {
        pb.set_message("Obfuscating files...");
        return;
    };

    let remaining = progress.estimated_remaining();
    if remaining.as_secs() > 0 {
        pb.set_message(format!(
            "Obfuscated {} (ETA: {})",
            current_file,
            format_duration(remaining)
        ));
    } else {
        pb.set_message(format!("Obfuscated {}", current_file));
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    pb.finish_with_message(format!(
        "{} (completed in {})",
        message,
        format_duration(duration)
    ));
}
