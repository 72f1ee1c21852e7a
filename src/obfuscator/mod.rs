pub mod file_processor;
pub mod renamer;
pub mod report;

pub use file_processor::{FileProcessor, ObfuscationProgress};
pub use renamer::{IdentifierRenamer, RenameFailure, RenameOutcome, TreeSitterRenamer};
pub use report::{FileRecord, ObfuscationReport, ObfuscationSummary};
