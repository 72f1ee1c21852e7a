use crate::config::FilterConfig;
use regex::Regex;
use std::path::Path;

pub struct FileFilter {
    mime_types: Vec<String>,
    processed_marker: String,
    exclude_dirs: Vec<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            mime_types: config
                .mime_types
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            processed_marker: config.processed_marker.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
            exclude_patterns,
        }
    }

    /// True when the MIME type guessed from the extension is a target type.
    pub fn is_source_file(&self, path: &Path) -> bool {
        mime_guess::from_path(path)
            .iter()
            .any(|mime| self.mime_types.contains(&mime.essence_str().to_lowercase()))
    }

    /// True for names like `app.jeff.js`, written by an earlier run.
    pub fn is_processed_output(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };
        let Some(extension) = path.extension().and_then(|s| s.to_str()) else {
            return false;
        };

        let suffix = format!(".{}.{}", self.processed_marker, extension);
        file_name.len() > suffix.len() && file_name.ends_with(&suffix)
    }

    pub fn is_candidate(&self, path: &Path) -> bool {
        self.is_source_file(path) && !self.is_processed_output(path) && !self.is_excluded(path)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(&path_str))
    }

    pub fn should_traverse_directory(&self, path: &Path) -> bool {
        if let Some(dir_name) = path.file_name().and_then(|s| s.to_str()) {
            if self
                .exclude_dirs
                .iter()
                .any(|exclude| exclude.eq_ignore_ascii_case(dir_name))
            {
                return false;
            }
        }

        !self.is_excluded(path)
    }

    pub fn processed_marker(&self) -> &str {
        &self.processed_marker
    }

    pub fn get_mime_types(&self) -> &Vec<String> {
        &self.mime_types
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        let config = FilterConfig::default();
        Self::new(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> FilterConfig {
        FilterConfig {
            exclude_dirs: vec!["node_modules".to_string()],
            exclude_patterns: vec![r".*\.min\.js$".to_string()],
            ..FilterConfig::default()
        }
    }

    #[test]
    fn test_source_file_detection() {
        let filter = FileFilter::default();

        assert!(filter.is_source_file(Path::new("app.js")));
        assert!(filter.is_source_file(Path::new("lib/nested/util.js")));
        assert!(filter.is_source_file(Path::new("APP.JS")));

        assert!(!filter.is_source_file(Path::new("notJs.css")));
        assert!(!filter.is_source_file(Path::new("data.json")));
        assert!(!filter.is_source_file(Path::new("README.md")));
        assert!(!filter.is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn test_processed_output_detection() {
        let filter = FileFilter::default();

        assert!(filter.is_processed_output(Path::new("a.jeff.js")));
        assert!(filter.is_processed_output(Path::new("dir/js1.jeff.js")));

        assert!(!filter.is_processed_output(Path::new("a.js")));
        assert!(!filter.is_processed_output(Path::new("jeff.js")));
        assert!(!filter.is_processed_output(Path::new("a.jeffrey.js")));
    }

    #[test]
    fn test_candidate_combines_rules() {
        let config = create_test_config();
        let filter = FileFilter::new(&config);

        assert!(filter.is_candidate(Path::new("src/app.js")));
        assert!(!filter.is_candidate(Path::new("src/app.jeff.js")));
        assert!(!filter.is_candidate(Path::new("src/app.min.js")));
        assert!(!filter.is_candidate(Path::new("src/style.css")));
    }

    #[test]
    fn test_directory_traversal_rules() {
        let config = create_test_config();
        let filter = FileFilter::new(&config);

        assert!(filter.should_traverse_directory(Path::new("src")));
        assert!(filter.should_traverse_directory(Path::new(".hidden")));
        assert!(!filter.should_traverse_directory(Path::new("node_modules")));
        assert!(!filter.should_traverse_directory(Path::new("Node_Modules")));
    }

    #[test]
    fn test_custom_marker() {
        let config = FilterConfig {
            processed_marker: "obf".to_string(),
            ..FilterConfig::default()
        };
        let filter = FileFilter::new(&config);

        assert!(filter.is_processed_output(Path::new("a.obf.js")));
        assert!(!filter.is_processed_output(Path::new("a.jeff.js")));
        assert_eq!(filter.processed_marker(), "obf");
    }
}
