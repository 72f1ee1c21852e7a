use crate::config::AncestorStrategy;
use crate::error::{JeffError, Result};
use crate::paths::ancestor::{compute_lowest_common_ancestor, CommonAncestor};
use crate::scanner::CandidateSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

pub const DEFAULT_MARKER: &str = "jeff";

/// Inserts `.{marker}` before the final extension: `a.js` becomes `a.jeff.js`.
pub fn insert_marker(file: &Path, marker: &str) -> PathBuf {
    let Some(stem) = file.file_stem() else {
        return file.to_path_buf();
    };

    let mut name = OsString::from(stem);
    name.push(".");
    name.push(marker);
    if let Some(extension) = file.extension() {
        name.push(".");
        name.push(extension);
    }

    file.with_file_name(name)
}

/// Maps every file of one run to its destination.
///
/// The common ancestor is computed once, when the mapper is built, and
/// reused for each file.
#[derive(Debug, Clone)]
pub struct OutputPathMapper {
    marker: String,
    strategy: AncestorStrategy,
    output_root: Option<PathBuf>,
    ancestor: Option<CommonAncestor>,
}

impl OutputPathMapper {
    pub fn new(candidates: &CandidateSet, output_root: Option<&Path>) -> Self {
        Self::with_options(
            candidates,
            output_root,
            AncestorStrategy::default(),
            DEFAULT_MARKER,
        )
    }

    pub fn with_options(
        candidates: &CandidateSet,
        output_root: Option<&Path>,
        strategy: AncestorStrategy,
        marker: &str,
    ) -> Self {
        let ancestor = match output_root {
            Some(_) => compute_lowest_common_ancestor(candidates, strategy),
            None => None,
        };

        Self {
            marker: marker.to_string(),
            strategy,
            output_root: output_root.map(Path::to_path_buf),
            ancestor,
        }
    }

    pub fn ancestor(&self) -> Option<&CommonAncestor> {
        self.ancestor.as_ref()
    }

    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    pub fn is_redirecting(&self) -> bool {
        self.output_root.is_some()
    }

    /// True when the mapper has an output root but still writes `file`
    /// beside its source. The textual search does this whenever the shared
    /// text is not found in the marked path, as with a single input file.
    pub fn ignores_output_root(&self, file: &Path) -> bool {
        if self.output_root.is_none() {
            return false;
        }

        match (&self.ancestor, self.strategy) {
            (None, _) => true,
            (Some(_), AncestorStrategy::Segments) => false,
            (Some(ancestor), AncestorStrategy::Textual) => !insert_marker(file, &self.marker)
                .to_string_lossy()
                .contains(ancestor.text.as_str()),
        }
    }

    pub fn output_path(&self, file: &Path) -> Result<PathBuf> {
        let marked = insert_marker(file, &self.marker);

        let (Some(root), Some(ancestor)) = (&self.output_root, &self.ancestor) else {
            return Ok(marked);
        };

        let destination = match self.strategy {
            AncestorStrategy::Segments => redirect_by_segments(&marked, ancestor, root)?,
            AncestorStrategy::Textual => redirect_by_text(&marked, ancestor, root),
        };

        tracing::trace!(
            source = %file.display(),
            destination = %destination.display(),
            "mapped output path"
        );

        Ok(destination)
    }
}

/// Stateless form of [`OutputPathMapper::output_path`] using the default
/// marker and the segment search.
pub fn compute_output_path(
    file: &Path,
    candidates: &CandidateSet,
    output_root: Option<&Path>,
) -> Result<PathBuf> {
    OutputPathMapper::new(candidates, output_root).output_path(file)
}

fn redirect_by_segments(marked: &Path, ancestor: &CommonAncestor, root: &Path) -> Result<PathBuf> {
    let relative = marked
        .strip_prefix(ancestor.as_path())
        .map_err(|_| JeffError::InvalidPath {
            path: format!(
                "{} is not below the common ancestor {}",
                marked.display(),
                ancestor.text
            ),
        })?;

    // An empty ancestor leaves absolute paths intact; keep them under root.
    let relative: PathBuf = relative
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();

    Ok(root.join(relative))
}

fn redirect_by_text(marked: &Path, ancestor: &CommonAncestor, root: &Path) -> PathBuf {
    let marked_str = marked.to_string_lossy();

    let Some(index) = marked_str.find(ancestor.text.as_str()) else {
        tracing::debug!(
            path = %marked.display(),
            ancestor = %ancestor.text,
            "common ancestor not found in path; writing beside source"
        );
        return marked.to_path_buf();
    };

    let root_str = root.to_string_lossy();
    let root_str = root_str.trim_end_matches(std::path::is_separator);
    let remainder = marked_str[index + ancestor.text.len()..].trim_start_matches(std::path::is_separator);

    PathBuf::from(format!(
        "{}{}{}{}",
        &marked_str[..index],
        root_str,
        MAIN_SEPARATOR,
        remainder
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> CandidateSet {
        CandidateSet::from_paths(paths.iter().copied())
    }

    #[test]
    fn test_insert_marker() {
        assert_eq!(insert_marker(Path::new("dir/a.js"), "jeff"), Path::new("dir/a.jeff.js"));
        assert_eq!(
            insert_marker(Path::new("/x/lib.min.js"), "jeff"),
            Path::new("/x/lib.min.jeff.js")
        );
        assert_eq!(insert_marker(Path::new("Makefile"), "jeff"), Path::new("Makefile.jeff"));
        assert_eq!(insert_marker(Path::new("a.js"), "obf"), Path::new("a.obf.js"));
    }

    #[test]
    fn test_in_place_output() {
        let files = set(&["dir/a.js"]);
        let output = compute_output_path(Path::new("dir/a.js"), &files, None).unwrap();
        assert_eq!(output, PathBuf::from("dir/a.jeff.js"));
    }

    #[test]
    fn test_redirect_preserves_structure() {
        let files = set(&["root/a.js", "root/sub/b.js"]);
        let out = Some(Path::new("/out"));

        assert_eq!(
            compute_output_path(Path::new("root/a.js"), &files, out).unwrap(),
            PathBuf::from("/out/a.jeff.js")
        );
        assert_eq!(
            compute_output_path(Path::new("root/sub/b.js"), &files, out).unwrap(),
            PathBuf::from("/out/sub/b.jeff.js")
        );
    }

    #[test]
    fn test_textual_redirect_preserves_structure() {
        let files = set(&["root/a.js", "root/sub/b.js"]);
        let mapper = OutputPathMapper::with_options(
            &files,
            Some(Path::new("/out/")),
            AncestorStrategy::Textual,
            DEFAULT_MARKER,
        );

        assert_eq!(
            mapper.output_path(Path::new("root/a.js")).unwrap(),
            PathBuf::from("/out/a.jeff.js")
        );
        assert_eq!(
            mapper.output_path(Path::new("root/sub/b.js")).unwrap(),
            PathBuf::from("/out/sub/b.jeff.js")
        );
    }

    #[test]
    fn test_single_file_redirect() {
        let files = set(&["/src/project/app.js"]);
        let output =
            compute_output_path(Path::new("/src/project/app.js"), &files, Some(Path::new("/out")))
                .unwrap();
        assert_eq!(output, PathBuf::from("/out/app.jeff.js"));
    }

    #[test]
    fn test_sibling_prefix_redirect() {
        let files = set(&["/a/foobar/x.js", "/a/foo/y.js"]);
        let root = Some(Path::new("/out"));

        let segments = OutputPathMapper::new(&files, root);
        assert_eq!(
            segments.output_path(Path::new("/a/foobar/x.js")).unwrap(),
            PathBuf::from("/out/foobar/x.jeff.js")
        );
        assert_eq!(
            segments.output_path(Path::new("/a/foo/y.js")).unwrap(),
            PathBuf::from("/out/foo/y.jeff.js")
        );

        let textual =
            OutputPathMapper::with_options(&files, root, AncestorStrategy::Textual, DEFAULT_MARKER);
        assert_eq!(
            textual.output_path(Path::new("/a/foobar/x.js")).unwrap(),
            PathBuf::from("/out/bar/x.jeff.js")
        );
    }

    #[test]
    fn test_disjoint_relative_paths_redirect() {
        let files = set(&["left/x.js", "right/y.js"]);
        let mapper = OutputPathMapper::new(&files, Some(Path::new("/out")));
        assert_eq!(
            mapper.output_path(Path::new("right/y.js")).unwrap(),
            PathBuf::from("/out/right/y.jeff.js")
        );
    }

    #[test]
    fn test_file_outside_candidates_is_rejected() {
        let files = set(&["/a/b/x.js", "/a/b/y.js"]);
        let mapper = OutputPathMapper::new(&files, Some(Path::new("/out")));
        let result = mapper.output_path(Path::new("/elsewhere/z.js"));
        assert!(matches!(result, Err(JeffError::InvalidPath { .. })));
    }

    #[test]
    fn test_textual_single_file_ignores_output_root() {
        let files = set(&["/src/project/app.js"]);
        let root = Some(Path::new("/out"));

        let textual =
            OutputPathMapper::with_options(&files, root, AncestorStrategy::Textual, DEFAULT_MARKER);
        assert!(textual.ignores_output_root(Path::new("/src/project/app.js")));
        assert_eq!(
            textual.output_path(Path::new("/src/project/app.js")).unwrap(),
            PathBuf::from("/src/project/app.jeff.js")
        );

        let segments = OutputPathMapper::new(&files, root);
        assert!(!segments.ignores_output_root(Path::new("/src/project/app.js")));

        let in_place = OutputPathMapper::new(&files, None);
        assert!(!in_place.ignores_output_root(Path::new("/src/project/app.js")));

        let tree = set(&["root/a.js", "root/sub/b.js"]);
        let textual =
            OutputPathMapper::with_options(&tree, root, AncestorStrategy::Textual, DEFAULT_MARKER);
        assert!(!textual.ignores_output_root(Path::new("root/sub/b.js")));
    }

    #[test]
    fn test_mapper_reports_mode() {
        let files = set(&["/a/x.js"]);
        assert!(!OutputPathMapper::new(&files, None).is_redirecting());
        assert!(OutputPathMapper::new(&files, None).ancestor().is_none());

        let mapper = OutputPathMapper::new(&files, Some(Path::new("/out")));
        assert!(mapper.is_redirecting());
        assert_eq!(mapper.ancestor().unwrap().as_path(), Path::new("/a"));
    }
}
