//! Lexical path handling
//!
//! Resolution here never touches the disk: a virtual path has no real
//! counterpart to consult, so `.`/`..` and relative forms are resolved
//! purely from the path text and the process working directory.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// A `..` at a root stays at the root; a relative path ascending above its
/// start keeps the leading `..` components. An empty input normalizes to
/// `.`, matching the host path rules the manifest keys were written under.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => result.push(".."),
            },
            other => result.push(other.as_os_str()),
        }
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Absolute, normalized form of a path.
///
/// Relative paths are joined onto the process working directory first.
pub fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        normalize(&base.join(path))
    }
}

/// Extended-length (`\\?\`) form of an absolute path.
///
/// Only Windows has such a form; elsewhere the absence is benign and every
/// caller treats `None` as "no alias to register".
#[cfg(windows)]
pub fn long_path(path: &Path) -> Option<PathBuf> {
    let text = path.to_str()?;
    if text.starts_with(r"\\?\") {
        Some(path.to_path_buf())
    } else if let Some(unc) = text.strip_prefix(r"\\") {
        Some(PathBuf::from(format!(r"\\?\UNC\{}", unc)))
    } else if path.is_absolute() {
        Some(PathBuf::from(format!(r"\\?\{}", text)))
    } else {
        None
    }
}

#[cfg(not(windows))]
pub fn long_path(_path: &Path) -> Option<PathBuf> {
    None
}
