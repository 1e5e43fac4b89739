//! Pass-through interface to the real filesystem
//!
//! The overlay never rebinds process-wide operations; misses delegate
//! through this capability trait, injected at construction. The trait
//! mirrors the overlaid read surface one-to-one so delegation preserves the
//! real operation's own error semantics. [`OsFilesystem`] is the production
//! implementation; tests substitute their own to observe fallback traffic.

use async_trait::async_trait;
use bytes::Bytes;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Real-filesystem operations the overlay can fall back to
#[async_trait]
pub trait RealFilesystem: Send + Sync {
    /// Whether a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Metadata for a path
    fn metadata(&self, path: &Path) -> io::Result<fs::Metadata>;

    /// Canonical form of a path
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Entry names of a directory
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Whole-file read, raw bytes
    fn read(&self, path: &Path) -> io::Result<Bytes>;

    /// Whole-file read, UTF-8 text
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Open a file for streaming reads
    fn open(&self, path: &Path) -> io::Result<fs::File>;

    /// Whether a path exists
    async fn exists_async(&self, path: &Path) -> bool;

    /// Metadata for a path
    async fn metadata_async(&self, path: &Path) -> io::Result<fs::Metadata>;

    /// Canonical form of a path
    async fn canonicalize_async(&self, path: &Path) -> io::Result<PathBuf>;

    /// Entry names of a directory
    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>>;

    /// Whole-file read, raw bytes
    async fn read_async(&self, path: &Path) -> io::Result<Bytes>;

    /// Whole-file read, UTF-8 text
    async fn read_to_string_async(&self, path: &Path) -> io::Result<String>;

    /// Open a file for streaming reads
    async fn open_async(&self, path: &Path) -> io::Result<tokio::fs::File>;
}

/// Production implementation backed by std and tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

#[async_trait]
impl RealFilesystem for OsFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn metadata(&self, path: &Path) -> io::Result<fs::Metadata> {
        fs::metadata(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            names.push(entry?.file_name());
        }
        Ok(names)
    }

    fn read(&self, path: &Path) -> io::Result<Bytes> {
        fs::read(path).map(Bytes::from)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn open(&self, path: &Path) -> io::Result<fs::File> {
        fs::File::open(path)
    }

    async fn exists_async(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn metadata_async(&self, path: &Path) -> io::Result<fs::Metadata> {
        tokio::fs::metadata(path).await
    }

    async fn canonicalize_async(&self, path: &Path) -> io::Result<PathBuf> {
        tokio::fs::canonicalize(path).await
    }

    async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name());
        }
        Ok(names)
    }

    async fn read_async(&self, path: &Path) -> io::Result<Bytes> {
        tokio::fs::read(path).await.map(Bytes::from)
    }

    async fn read_to_string_async(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn open_async(&self, path: &Path) -> io::Result<tokio::fs::File> {
        tokio::fs::File::open(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hello.txt");
        fs::write(&file, b"hello world").unwrap();

        let real = OsFilesystem;
        assert!(real.exists(&file));
        assert!(!real.exists(&dir.path().join("missing.txt")));
        assert_eq!(real.read(&file).unwrap().as_ref(), b"hello world");
        assert_eq!(real.read_to_string(&file).unwrap(), "hello world");

        let names = real.read_dir(dir.path()).unwrap();
        assert_eq!(names, vec![OsString::from("hello.txt")]);
    }

    #[tokio::test]
    async fn test_os_filesystem_async_matches_sync() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        fs::write(&file, b"\x00\x01\x02").unwrap();

        let real = OsFilesystem;
        assert!(real.exists_async(&file).await);
        assert_eq!(real.read_async(&file).await.unwrap(), real.read(&file).unwrap());
        assert_eq!(
            real.metadata_async(&file).await.unwrap().len(),
            real.metadata(&file).unwrap().len()
        );
    }
}
