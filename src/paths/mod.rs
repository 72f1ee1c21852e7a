pub mod ancestor;
pub mod output_path;

pub use ancestor::{compute_lowest_common_ancestor, CommonAncestor};
pub use output_path::{compute_output_path, insert_marker, OutputPathMapper, DEFAULT_MARKER};
