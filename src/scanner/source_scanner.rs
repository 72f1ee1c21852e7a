use crate::config::FilterConfig;
use crate::error::{JeffError, Result};
use crate::scanner::file_filter::FileFilter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Files selected for one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    files: Vec<PathBuf>,
}

impl CandidateSet {
    /// Builds a set from already-filtered paths, dropping repeats.
    pub(crate) fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut files: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn first(&self) -> Option<&PathBuf> {
        self.files.first()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.files.iter()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| std::fs::metadata(f).ok())
            .map(|m| m.len())
            .sum()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

pub struct SourceScanner {
    filter: FileFilter,
    follow_links: bool,
}

impl SourceScanner {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            follow_links: config.follow_links,
        }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    pub fn resolve(&self, root: Option<&Path>) -> Result<CandidateSet> {
        let root_path = root.ok_or(JeffError::MissingInput)?;

        if !root_path.exists() {
            return Err(JeffError::NotFound {
                path: root_path.to_path_buf(),
            });
        }

        let metadata = std::fs::metadata(root_path)
            .map_err(|e| JeffError::file_io(root_path, e))?;

        if !metadata.is_dir() {
            // Only the type check applies here; an explicitly named
            // `*.jeff.js` file is processed like any other.
            if !self.filter.is_source_file(root_path) {
                return Err(JeffError::UnsupportedType {
                    path: root_path.to_path_buf(),
                });
            }

            tracing::debug!(path = %root_path.display(), "resolved single source file");
            return Ok(CandidateSet::from_paths([root_path]));
        }

        let files = self.scan_directory(root_path)?;
        tracing::debug!(
            root = %root_path.display(),
            count = files.len(),
            "resolved source files"
        );

        Ok(CandidateSet::from_paths(files))
    }

    fn scan_directory(&self, root_path: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(root_path)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_traverse(e));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root_path.to_path_buf());
                match err.into_io_error() {
                    Some(io) => JeffError::file_io(path, io),
                    None => JeffError::InvalidPath {
                        path: format!("Filesystem loop detected at {}", path.display()),
                    },
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.filter.is_candidate(path) {
                files.push(path.to_path_buf());
            } else {
                tracing::trace!(path = %path.display(), "skipping non-candidate file");
            }
        }

        Ok(files)
    }

    fn should_traverse(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        self.filter.should_traverse_directory(entry.path())
    }
}
