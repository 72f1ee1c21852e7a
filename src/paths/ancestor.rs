//! Lowest common ancestor of a set of candidate files.
//!
//! Two searches are available. [`AncestorStrategy::Segments`] compares
//! separator-delimited components and always lands on a directory boundary.
//! [`AncestorStrategy::Textual`] reproduces the older string search, which
//! takes the longest run of the first path found anywhere in every other
//! path. The textual search can stop inside a directory name when two
//! siblings share a prefix (`/a/foobar` and `/a/foo`).

use crate::config::AncestorStrategy;
use crate::scanner::CandidateSet;
use std::path::{Component, Path, PathBuf};

/// Substring of a candidate path shared by every candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonAncestor {
    /// Byte offset of the match. For the textual search this is the offset
    /// inside the compared path, not the first one.
    pub position: usize,
    /// Length of the match in bytes.
    pub length: usize,
    /// The ancestor as it is substituted when redirecting output.
    pub text: String,
}

impl CommonAncestor {
    pub fn as_path(&self) -> &Path {
        Path::new(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Returns `None` only for an empty set.
pub fn compute_lowest_common_ancestor(
    paths: &CandidateSet,
    strategy: AncestorStrategy,
) -> Option<CommonAncestor> {
    if paths.is_empty() {
        return None;
    }

    let ancestor = match strategy {
        AncestorStrategy::Segments => segment_ancestor(paths.files()),
        AncestorStrategy::Textual => textual_ancestor(paths.files()),
    };

    tracing::debug!(
        ?strategy,
        ancestor = %ancestor.text,
        files = paths.len(),
        "computed common ancestor"
    );

    Some(ancestor)
}

fn segment_ancestor(files: &[PathBuf]) -> CommonAncestor {
    let parent_of = |file: &PathBuf| file.parent().map(Path::to_path_buf).unwrap_or_default();

    let first = parent_of(&files[0]);
    let mut common: Vec<Component<'_>> = first.components().collect();

    for file in &files[1..] {
        let parent = parent_of(file);
        let shared = common
            .iter()
            .zip(parent.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    let ancestor: PathBuf = common.iter().collect();
    let text = ancestor.to_string_lossy().into_owned();

    CommonAncestor {
        position: 0,
        length: text.len(),
        text,
    }
}

fn textual_ancestor(files: &[PathBuf]) -> CommonAncestor {
    let first = files[0].to_string_lossy();

    if files.len() < 2 {
        let position = first.rfind(std::path::is_separator).unwrap_or(0);
        let text = first[position..].to_string();
        return CommonAncestor {
            position,
            length: text.len(),
            text,
        };
    }

    let mut shortest: Option<(usize, usize)> = None;
    for other in &files[1..] {
        let other = other.to_string_lossy();
        let (position, length) = find_intersection_from_start(&first, &other).unwrap_or((0, 0));

        if shortest.is_none_or(|(_, best)| length < best) {
            shortest = Some((position, length));
        }
    }

    let (position, length) = shortest.unwrap_or((0, 0));
    let end = (position + length).min(first.len());
    let text = first.get(position..end).unwrap_or_default().to_string();

    CommonAncestor {
        position,
        length,
        text,
    }
}

/// Longest prefix of `a` occurring anywhere in `b`, as `(offset in b, length)`.
pub fn find_intersection_from_start(a: &str, b: &str) -> Option<(usize, usize)> {
    let mut end = a.len();
    while end > 0 {
        if a.is_char_boundary(end) {
            if let Some(position) = b.find(&a[..end]) {
                return Some((position, end));
            }
        }
        end -= 1;
    }

    None
}
