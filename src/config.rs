use crate::error::{JeffError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub filters: FilterConfig,
    pub output: OutputConfig,
    pub rename: RenameConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    pub mime_types: Vec<String>,
    pub processed_marker: String,
    pub exclude_dirs: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub follow_links: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub ancestor_strategy: AncestorStrategy,
    pub output_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RenameConfig {
    pub mangle_toplevel: bool,
    pub reserved: Vec<String>,
}

/// How the shared ancestor of the candidate files is located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AncestorStrategy {
    /// Common prefix of separator-delimited path components.
    #[default]
    Segments,
    /// Longest common substring anchored at the start of the first path.
    Textual,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mime_types: vec![
                "application/javascript".to_string(),
                "text/javascript".to_string(),
            ],
            processed_marker: "jeff".to_string(),
            exclude_dirs: Vec::new(),
            exclude_patterns: Vec::new(),
            follow_links: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(JeffError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| JeffError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| JeffError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["jeffuscator.toml", ".jeffuscator.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        tracing::debug!(path = default_path, "loading default configuration");
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.output_directory = Some(output_dir.clone());
        }

        if let Some(strategy) = cli_args.ancestor_strategy {
            self.output.ancestor_strategy = strategy;
        }

        if let Some(ref exclude) = cli_args.exclude {
            self.filters.exclude_dirs.extend(exclude.iter().cloned());
        }

        if let Some(mangle) = cli_args.mangle_toplevel {
            self.rename.mangle_toplevel = mangle;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| JeffError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| JeffError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.mime_types.is_empty() {
            return Err(JeffError::Config {
                message: "At least one MIME type must be specified".to_string(),
            });
        }

        let marker = &self.filters.processed_marker;
        if marker.is_empty() {
            return Err(JeffError::Config {
                message: "The processed marker cannot be empty".to_string(),
            });
        }

        if marker.contains(['/', '\\', '.']) {
            return Err(JeffError::Config {
                message: format!(
                    "The processed marker must be a plain name without dots or separators: {}",
                    marker
                ),
            });
        }

        for pattern in &self.filters.exclude_patterns {
            if let Err(e) = Regex::new(pattern) {
                return Err(JeffError::Config {
                    message: format!("Invalid exclude pattern {}: {}", pattern, e),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub ancestor_strategy: Option<AncestorStrategy>,
    pub exclude: Option<Vec<String>>,
    pub mangle_toplevel: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_ancestor_strategy(mut self, strategy: Option<AncestorStrategy>) -> Self {
        self.ancestor_strategy = strategy;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_mangle_toplevel(mut self, mangle: Option<bool>) -> Self {
        self.mangle_toplevel = mangle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config
            .filters
            .mime_types
            .contains(&"application/javascript".to_string()));
        assert_eq!(config.filters.processed_marker, "jeff");
        assert_eq!(config.output.ancestor_strategy, AncestorStrategy::Segments);
        assert!(config.output.output_directory.is_none());
        assert!(!config.rename.mangle_toplevel);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.filters.mime_types.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.filters.processed_marker = "je.ff".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.filters.exclude_patterns.push("(unclosed".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.output.ancestor_strategy = AncestorStrategy::Textual;
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.output.ancestor_strategy, AncestorStrategy::Textual);
        assert_eq!(loaded_config.filters.processed_marker, "jeff");
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[rename]\nmangle_toplevel = true").unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert!(config.rename.mangle_toplevel);
        assert_eq!(config.filters.mime_types.len(), 2);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("does/not/exist.toml");
        assert!(matches!(result, Err(JeffError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_output_dir(Some(PathBuf::from("/tmp/out")))
            .with_ancestor_strategy(Some(AncestorStrategy::Textual))
            .with_exclude(Some(vec!["vendor".to_string()]));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.output.output_directory, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.output.ancestor_strategy, AncestorStrategy::Textual);
        assert_eq!(config.filters.exclude_dirs, vec!["vendor"]);
        assert!(!config.rename.mangle_toplevel);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(!sample.is_empty());
        assert!(sample.contains("[filters]"));
        assert!(sample.contains("[output]"));
        assert!(sample.contains("[rename]"));
        assert!(sample.contains("ancestor_strategy = \"segments\""));
    }
}
