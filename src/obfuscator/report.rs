use crate::config::AncestorStrategy;
use crate::obfuscator::file_processor::ObfuscationProgress;
use crate::paths::OutputPathMapper;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub renamed_identifiers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationSummary {
    pub files_processed: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub identifiers_renamed: usize,
    pub duration: Duration,
}

/// Outcome of one run, or of a dry run when `dry_run` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObfuscationReport {
    pub input_root: PathBuf,
    pub output_root: Option<PathBuf>,
    pub common_ancestor: Option<String>,
    pub ancestor_strategy: AncestorStrategy,
    pub dry_run: bool,
    pub summary: ObfuscationSummary,
    pub files: Vec<FileRecord>,
    pub completed_at: DateTime<Utc>,
}

impl ObfuscationReport {
    pub fn from_progress(
        input_root: PathBuf,
        mapper: &OutputPathMapper,
        strategy: AncestorStrategy,
        progress: ObfuscationProgress,
    ) -> Self {
        let summary = ObfuscationSummary {
            files_processed: progress.files_processed,
            bytes_read: progress.records.iter().map(|r| r.bytes_read).sum(),
            bytes_written: progress.records.iter().map(|r| r.bytes_written).sum(),
            identifiers_renamed: progress.records.iter().map(|r| r.renamed_identifiers).sum(),
            duration: progress.elapsed(),
        };

        Self {
            input_root,
            output_root: mapper.output_root().map(PathBuf::from),
            common_ancestor: mapper.ancestor().map(|a| a.text.clone()),
            ancestor_strategy: strategy,
            dry_run: false,
            summary,
            files: progress.records,
            completed_at: Utc::now(),
        }
    }

    /// Planned destinations without reading or writing any file contents.
    pub fn planned(
        input_root: PathBuf,
        mapper: &OutputPathMapper,
        strategy: AncestorStrategy,
        files: Vec<FileRecord>,
    ) -> Self {
        let summary = ObfuscationSummary {
            files_processed: 0,
            bytes_read: files.iter().map(|r| r.bytes_read).sum(),
            bytes_written: 0,
            identifiers_renamed: 0,
            duration: Duration::ZERO,
        };

        Self {
            input_root,
            output_root: mapper.output_root().map(PathBuf::from),
            common_ancestor: mapper.ancestor().map(|a| a.text.clone()),
            ancestor_strategy: strategy,
            dry_run: true,
            summary,
            files,
            completed_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
