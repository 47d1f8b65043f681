//! Canonical entry-name handling.
//!
//! Entry names use `/` as the separator. Canonical names have no leading and
//! no trailing separator; the root is the empty string. Archive entries
//! written on Windows may arrive with backslashes, so the normalizer accepts
//! either separator and always emits `/`.

/// The canonical path of the filesystem root.
pub const ROOT_PATH: &str = "";

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Normalize a path: collapse runs of separators, resolve `.` segments, and
/// resolve `..` segments by popping the preceding segment.
///
/// A `..` with nothing left to pop is preserved, so escaping names stay
/// recognizable. An absolute prefix is preserved as a single leading `/`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with(SEPARATORS);
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                None | Some(&"..") => segments.push(".."),
                Some(_) => {
                    segments.pop();
                }
            },
            _ => segments.push(segment),
        }
    }
    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    out
}

/// Remove trailing separators. A path consisting only of separators becomes
/// the root path.
pub fn cut_trailing_separators(path: &str) -> &str {
    path.trim_end_matches(SEPARATORS)
}

/// Canonicalize a name: normalize it and cut trailing separators.
pub fn canonicalize(name: &str) -> String {
    cut_trailing_separators(&normalize(name)).to_owned()
}

/// Split a path at its last separator into `(parent, base)`.
///
/// A single-segment path has the root as its parent.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(at) => (&path[..at], &path[at + 1..]),
        None => (ROOT_PATH, path),
    }
}

/// Returns true if `path` names the filesystem root.
pub fn is_root(path: &str) -> bool {
    path.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["a//b/./c/../d", "\\x\\y\\", "../..", "/abs/./p"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "normalizing {raw:?} twice");
        }
    }

    #[test]
    fn split_single_segment_has_root_parent() {
        assert_eq!(split("a"), ("", "a"));
        assert_eq!(split("a/b"), ("a", "b"));
        assert_eq!(split("a/b/c.txt"), ("a/b", "c.txt"));
    }

    #[test]
    fn root_detection() {
        assert!(is_root(""));
        assert!(!is_root("a"));
        assert!(is_root(cut_trailing_separators("/")));
        assert!(is_root(cut_trailing_separators("///")));
    }
}
