//! Virtual path resolution.
//!
//! Clients see an absolute POSIX tree rooted at `/`. Every path argument a
//! client sends is resolved against the session's current working
//! directory through [`resolve`] before it reaches a storage back-end, so
//! back-ends only ever see absolute, normalized virtual paths.

use std::path::{Path, PathBuf};

/// Resolves a client-supplied path argument against the given working
/// directory into an absolute, normalized virtual path.
///
/// Rules: an argument starting with `/` resolves from the root, anything
/// else from `cwd`. `.` segments are dropped, `..` pops one segment and
/// clamps at the root, empty segments (`//`) are ignored. The result
/// always starts with `/` and contains no `.` or `..` components.
pub fn resolve<P: AsRef<Path>>(cwd: P, arg: &str) -> PathBuf {
    let mut segments: Vec<String> = Vec::new();
    if !arg.starts_with('/') {
        for segment in cwd.as_ref().to_string_lossy().split('/') {
            if !segment.is_empty() {
                segments.push(segment.to_string());
            }
        }
    }
    for segment in arg.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other.to_string()),
        }
    }
    PathBuf::from(format!("/{}", segments.join("/")))
}

/// Returns the last segment of a virtual path, or `/` for the root.
pub fn basename(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "/".to_string())
}
