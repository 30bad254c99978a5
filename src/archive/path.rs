/// What to do with entry paths that could escape an extraction directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// Keep the path as written and log a warning
    #[default]
    Permissive,
    /// Refuse to build the archive
    Strict,
}

/// Why `path` is unsafe as an archive entry name, if it is.
pub fn unsafe_reason(path: &str) -> Option<&'static str> {
    if path.starts_with('/') || has_drive_prefix(path) {
        return Some("absolute path");
    }
    if path.contains('\0') {
        return Some("NUL character");
    }
    if path.contains('\\') {
        return Some("backslash separator");
    }
    if path.split('/').any(|segment| segment == "..") {
        return Some("parent directory segment");
    }
    if path.split('/').any(str::is_empty) {
        return Some("empty path segment");
    }
    None
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
