use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JeffError {
    #[error("Directory or file is required")]
    MissingInput,

    #[error("Directory or path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("File is not a JavaScript file: {}", path.display())]
    UnsupportedType { path: PathBuf },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to access {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename identifiers in {}: {message}", path.display())]
    Rename { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path mapping failed: {path}")]
    InvalidPath { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl JeffError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JeffError::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Process exit status reported by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            JeffError::Cancelled => 130,
            JeffError::Config { .. } => 2,
            JeffError::NotFound { .. } => 3,
            JeffError::UnsupportedType { .. } => 4,
            JeffError::Io(_) | JeffError::FileIo { .. } => 5,
            JeffError::Rename { .. } => 6,
            JeffError::MissingInput | JeffError::InvalidPath { .. } => 1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for JeffError {
    fn user_message(&self) -> String {
        match self {
            JeffError::MissingInput => "The input option is required.".to_string(),
            JeffError::NotFound { path } => {
                format!("Directory or path does not exist: {}", path.display())
            }
            JeffError::UnsupportedType { path } => {
                format!("File is not a JavaScript file: {}", path.display())
            }
            JeffError::FileIo { path, source } => match source.kind() {
                std::io::ErrorKind::PermissionDenied => {
                    format!("Permission denied accessing: {}", path.display())
                }
                _ => format!("Could not access {}: {}", path.display(), source),
            },
            JeffError::Rename { path, message } => {
                format!("Could not process {}: {}", path.display(), message)
            }
            JeffError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            JeffError::InvalidPath { path } => {
                format!("Invalid output path: {}", path)
            }
            JeffError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            JeffError::MissingInput => Some(
                "Pass a JavaScript file or a directory with --input-path (e.g., jeffuscator -i src)".to_string()
            ),
            JeffError::NotFound { .. } => Some(
                "Check the spelling of the path. Relative paths are resolved against the current directory.".to_string()
            ),
            JeffError::UnsupportedType { .. } => Some(
                "Only .js files can be processed. Pass a directory to process every JavaScript file it contains.".to_string()
            ),
            JeffError::Io(_) | JeffError::FileIo { .. } => Some(
                "Ensure you have the necessary read/write permissions for the source and output directories.".to_string()
            ),
            JeffError::Rename { .. } => Some(
                "Fix the syntax errors reported for this file, or move it out of the input directory.".to_string()
            ),
            JeffError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config.".to_string()
            ),
            JeffError::Cancelled => Some(
                "Files written before the interruption are kept. Re-run the same command to finish; processed files are skipped as inputs.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for JeffError {
    fn from(error: toml::de::Error) -> Self {
        JeffError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JeffError>;
