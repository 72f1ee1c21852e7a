pub mod cli;
pub mod config;
pub mod error;
pub mod obfuscator;
pub mod paths;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{AncestorStrategy, CliOverrides, Config, FilterConfig, OutputConfig, RenameConfig};
pub use error::{JeffError, Result, UserFriendlyError};

// Core functionality re-exports
pub use obfuscator::{
    FileProcessor, FileRecord, IdentifierRenamer, ObfuscationProgress, ObfuscationReport,
    TreeSitterRenamer,
};
pub use paths::{compute_lowest_common_ancestor, compute_output_path, CommonAncestor, OutputPathMapper};
pub use scanner::{CandidateSet, FileFilter, SourceScanner};
pub use ui::{OutputFormatter, OutputMode, ProgressManager, StopSignal};

use std::path::{Path, PathBuf};

/// Main library interface for obfuscating a file or a directory tree.
pub struct Jeffuscator {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: StopSignal,
}

impl Jeffuscator {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = StopSignal::new();
        shutdown.install_ctrlc_handler()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Same as [`Jeffuscator::new`] without registering a Ctrl+C handler.
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: StopSignal::new(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Obfuscates every JavaScript file under `input` with the tree-sitter
    /// renamer configured by the `[rename]` section.
    pub fn obfuscate(&self, input: Option<&Path>) -> Result<ObfuscationReport> {
        let renamer = TreeSitterRenamer::new(&self.config.rename);
        self.obfuscate_with(input, Box::new(renamer))
    }

    pub fn obfuscate_with(
        &self,
        input: Option<&Path>,
        renamer: Box<dyn IdentifierRenamer>,
    ) -> Result<ObfuscationReport> {
        self.shutdown.check()?;

        let candidates = self.scan_sources(input)?;
        let input_root = input.map(Path::to_path_buf).unwrap_or_default();
        self.shutdown.check()?;

        let mapper = self.create_mapper(&candidates)?;
        let processor = FileProcessor::new(renamer);
        let progress = self.process_files(&processor, &candidates, &mapper)?;

        Ok(ObfuscationReport::from_progress(
            input_root,
            &mapper,
            self.config.output.ancestor_strategy,
            progress,
        ))
    }

    /// Resolves the candidates and their destinations without touching
    /// any output file.
    pub fn plan(&self, input: Option<&Path>) -> Result<ObfuscationReport> {
        let candidates = self.scan_sources(input)?;
        let mapper = self.create_mapper(&candidates)?;

        let mut files = Vec::with_capacity(candidates.len());
        for source in &candidates {
            let destination = mapper.output_path(source)?;
            let bytes_read = std::fs::metadata(source).map(|m| m.len()).unwrap_or(0);
            files.push(FileRecord {
                source: source.clone(),
                destination,
                bytes_read,
                bytes_written: 0,
                renamed_identifiers: 0,
            });
        }

        Ok(ObfuscationReport::planned(
            input.map(Path::to_path_buf).unwrap_or_default(),
            &mapper,
            self.config.output.ancestor_strategy,
            files,
        ))
    }

    fn scan_sources(&self, input: Option<&Path>) -> Result<CandidateSet> {
        self.output_formatter
            .start_operation("Scanning for JavaScript files");

        let spinner = self.progress_manager.create_spinner("Scanning...");
        let scanner = SourceScanner::new(&self.config.filters);
        let result = scanner.resolve(input);
        spinner.finish_and_clear();

        let candidates = result?;
        if candidates.is_empty() {
            self.output_formatter.warning(&format!(
                "No JavaScript files found in {}",
                input.map(|p| p.display().to_string()).unwrap_or_default()
            ));
        } else {
            self.output_formatter
                .info(&format!("Found {} JavaScript files", candidates.len()));
        }

        Ok(candidates)
    }

    fn create_mapper(&self, candidates: &CandidateSet) -> Result<OutputPathMapper> {
        let output_root: Option<PathBuf> = self
            .config
            .output
            .output_directory
            .as_deref()
            .map(cli::absolutize)
            .transpose()?;

        let mapper = OutputPathMapper::with_options(
            candidates,
            output_root.as_deref(),
            self.config.output.ancestor_strategy,
            &self.config.filters.processed_marker,
        );

        if let Some(ancestor) = mapper.ancestor() {
            self.output_formatter
                .debug(&format!("Common ancestor: {}", ancestor.text));
        }

        let beside_source = candidates
            .iter()
            .filter(|file| mapper.ignores_output_root(file))
            .count();
        if beside_source > 0 {
            self.output_formatter.warning(&format!(
                "Output directory ignored for {} file(s): the common ancestor does not occur \
                 in their paths, so they are written beside their sources",
                beside_source
            ));
        }

        Ok(mapper)
    }

    fn process_files(
        &self,
        processor: &FileProcessor,
        candidates: &CandidateSet,
        mapper: &OutputPathMapper,
    ) -> Result<ObfuscationProgress> {
        if candidates.is_empty() {
            return Ok(ObfuscationProgress::new(0, 0));
        }

        self.output_formatter
            .start_operation("Obfuscating JavaScript files");

        let file_progress = self
            .progress_manager
            .create_file_progress(candidates.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ObfuscationProgress| {
                ui::progress::update_file_progress(&pb, progress);
            }
        };

        let result = processor.process_files(
            candidates,
            mapper,
            Some(&self.shutdown),
            Some(&progress_callback),
        );

        match result {
            Ok(progress) => {
                ui::progress::finish_progress_with_summary(
                    &file_progress,
                    &format!("Obfuscated {} files", progress.files_processed),
                    progress.elapsed(),
                );
                Ok(progress)
            }
            Err(e) => {
                file_progress.abandon();
                Err(e)
            }
        }
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let path = output_path.as_ref();
        let sample_config = Config::create_sample_config();
        std::fs::write(path, sample_config).map_err(|e| JeffError::file_io(path, e))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_requested()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    pub fn handle_error(&self, error: &JeffError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Jeffuscator {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
