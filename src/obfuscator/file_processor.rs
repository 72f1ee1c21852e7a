use crate::error::{JeffError, Result};
use crate::obfuscator::renamer::IdentifierRenamer;
use crate::obfuscator::report::FileRecord;
use crate::paths::OutputPathMapper;
use crate::scanner::CandidateSet;
use crate::ui::StopSignal;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ObfuscationProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub records: Vec<FileRecord>,
}

impl ObfuscationProgress {
    pub fn new(total_files: usize, total_bytes: u64) -> Self {
        Self {
            files_processed: 0,
            total_files,
            bytes_processed: 0,
            total_bytes,
            current_file: None,
            start_time: Instant::now(),
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, record: FileRecord) {
        self.files_processed += 1;
        self.bytes_processed += record.bytes_read;
        self.current_file = record
            .source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.records.push(record);
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let rate = self.files_processed as f64 / self.elapsed().as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 && rate.is_finite() {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Reads, renames and writes each candidate file.
pub struct FileProcessor {
    renamer: Box<dyn IdentifierRenamer>,
}

impl FileProcessor {
    pub fn new(renamer: Box<dyn IdentifierRenamer>) -> Self {
        Self { renamer }
    }

    /// Processes the candidates in order and stops at the first failure.
    /// Files written before a failure or a shutdown request are kept.
    pub fn process_files(
        &self,
        candidates: &CandidateSet,
        mapper: &OutputPathMapper,
        shutdown: Option<&StopSignal>,
        progress_callback: Option<&dyn Fn(&ObfuscationProgress)>,
    ) -> Result<ObfuscationProgress> {
        let mut progress = ObfuscationProgress::new(candidates.len(), candidates.total_bytes());

        for file in candidates {
            if let Some(shutdown) = shutdown {
                shutdown.check()?;
            }

            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let record = self.process_file(file, mapper)?;
            progress.record(record);
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        tracing::debug!(
            files = progress.files_processed,
            bytes = progress.bytes_processed,
            "processed candidate files"
        );

        Ok(progress)
    }

    pub fn process_file(&self, source: &Path, mapper: &OutputPathMapper) -> Result<FileRecord> {
        let code = fs::read_to_string(source).map_err(|e| JeffError::file_io(source, e))?;

        let outcome = self
            .renamer
            .rename_identifiers(&code)
            .map_err(|failure| JeffError::Rename {
                path: source.to_path_buf(),
                message: failure.message,
            })?;

        let destination = mapper.output_path(source)?;
        if destination == source {
            return Err(JeffError::InvalidPath {
                path: format!("refusing to overwrite source file {}", source.display()),
            });
        }

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| JeffError::file_io(parent, e))?;
            }
        }

        fs::write(&destination, outcome.code.as_bytes())
            .map_err(|e| JeffError::file_io(&destination, e))?;

        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            renamed = outcome.renamed,
            "wrote obfuscated file"
        );

        Ok(FileRecord {
            source: source.to_path_buf(),
            destination,
            bytes_read: code.len() as u64,
            bytes_written: outcome.code.len() as u64,
            renamed_identifiers: outcome.renamed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obfuscator::renamer::{RenameFailure, RenameOutcome};
    use std::cell::Cell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct UppercaseRenamer;

    impl IdentifierRenamer for UppercaseRenamer {
        fn rename_identifiers(&self, source: &str) -> std::result::Result<RenameOutcome, RenameFailure> {
            Ok(RenameOutcome {
                code: source.to_uppercase(),
                renamed: 1,
            })
        }
    }

    struct FailingRenamer;

    impl IdentifierRenamer for FailingRenamer {
        fn rename_identifiers(&self, _source: &str) -> std::result::Result<RenameOutcome, RenameFailure> {
            Err(RenameFailure {
                message: "syntax error at line 1, column 1".to_string(),
            })
        }
    }

    fn create_sources(root: &Path) -> CandidateSet {
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.js"), "var a = 1;").unwrap();
        fs::write(root.join("sub").join("b.js"), "let b = 2;").unwrap();
        CandidateSet::from_paths([root.join("a.js"), root.join("sub").join("b.js")])
    }

    #[test]
    fn test_writes_beside_sources() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = create_sources(temp_dir.path());
        let mapper = OutputPathMapper::new(&candidates, None);
        let processor = FileProcessor::new(Box::new(UppercaseRenamer));

        let progress = processor
            .process_files(&candidates, &mapper, None, None)
            .unwrap();

        assert_eq!(progress.files_processed, 2);
        assert_eq!(progress.records.len(), 2);
        let written = fs::read_to_string(temp_dir.path().join("a.jeff.js")).unwrap();
        assert_eq!(written, "VAR A = 1;");
        assert!(temp_dir.path().join("sub").join("b.jeff.js").exists());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.js")).unwrap(),
            "var a = 1;"
        );
    }

    #[test]
    fn test_mirrors_tree_under_output_root() {
        let source_dir = TempDir::new().unwrap();
        let output_dir = TempDir::new().unwrap();
        let out = output_dir.path().join("out");
        let candidates = create_sources(source_dir.path());
        let mapper = OutputPathMapper::new(&candidates, Some(&out));
        let processor = FileProcessor::new(Box::new(UppercaseRenamer));

        processor
            .process_files(&candidates, &mapper, None, None)
            .unwrap();

        assert!(out.join("a.jeff.js").exists());
        assert!(out.join("sub").join("b.jeff.js").exists());
    }

    #[test]
    fn test_rename_failure_aborts_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = create_sources(temp_dir.path());
        let mapper = OutputPathMapper::new(&candidates, None);
        let processor = FileProcessor::new(Box::new(FailingRenamer));

        let result = processor.process_files(&candidates, &mapper, None, None);
        match result {
            Err(JeffError::Rename { path, message }) => {
                assert_eq!(path, temp_dir.path().join("a.js"));
                assert!(message.contains("syntax error"));
            }
            other => panic!("expected rename error, got {:?}", other.map(|p| p.files_processed)),
        }
        assert!(!temp_dir.path().join("a.jeff.js").exists());
    }

    #[test]
    fn test_missing_source_is_file_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.js");
        let candidates = CandidateSet::from_paths([missing.clone()]);
        let mapper = OutputPathMapper::new(&candidates, None);
        let processor = FileProcessor::new(Box::new(UppercaseRenamer));

        let result = processor.process_file(&missing, &mapper);
        assert!(matches!(result, Err(JeffError::FileIo { .. })));
    }

    #[test]
    fn test_shutdown_stops_between_files() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = create_sources(temp_dir.path());
        let mapper = OutputPathMapper::new(&candidates, None);
        let processor = FileProcessor::new(Box::new(UppercaseRenamer));
        let shutdown = StopSignal::new();
        shutdown.request();

        let result = processor.process_files(&candidates, &mapper, Some(&shutdown), None);
        assert!(matches!(result, Err(JeffError::Cancelled)));
        assert!(!temp_dir.path().join("a.jeff.js").exists());
    }

    #[test]
    fn test_progress_callback_and_empty_set() {
        let temp_dir = TempDir::new().unwrap();
        let candidates = create_sources(temp_dir.path());
        let mapper = OutputPathMapper::new(&candidates, None);
        let processor = FileProcessor::new(Box::new(UppercaseRenamer));

        let calls = Cell::new(0);
        let callback = |_: &ObfuscationProgress| calls.set(calls.get() + 1);
        processor
            .process_files(&candidates, &mapper, None, Some(&callback))
            .unwrap();
        assert_eq!(calls.get(), 3);

        let empty = CandidateSet::default();
        let progress = processor
            .process_files(&empty, &OutputPathMapper::new(&empty, None), None, None)
            .unwrap();
        assert_eq!(progress.files_processed, 0);
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = ObfuscationProgress::new(4, 400);
        assert_eq!(progress.percentage(), 0.0);

        progress.record(FileRecord {
            source: PathBuf::from("/src/a.js"),
            destination: PathBuf::from("/src/a.jeff.js"),
            bytes_read: 100,
            bytes_written: 80,
            renamed_identifiers: 2,
        });

        assert_eq!(progress.percentage(), 25.0);
        assert_eq!(progress.bytes_processed, 100);
        assert_eq!(progress.current_file.as_deref(), Some("a.js"));
    }
}
