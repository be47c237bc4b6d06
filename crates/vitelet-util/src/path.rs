//! Root-confined path handling for URL paths.

use std::path::{Component, Path, PathBuf};

/// Join a root-relative URL path onto `root`, refusing to leave it.
///
/// The URL path is normalised lexically: empty and `.` segments are dropped
/// and `..` pops the previous segment. Returns `None` when a `..` would climb
/// above `root`, or when a segment carries a prefix or root of its own
/// (e.g. a Windows drive letter).
#[must_use]
pub fn join_under_root(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in url_path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => {
                let mut components = Path::new(other).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(other),
                    _ => return None,
                }
            }
        }
    }

    let mut joined = root.to_path_buf();
    joined.extend(segments);
    Some(joined)
}
