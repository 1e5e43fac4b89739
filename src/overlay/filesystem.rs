//! Overlay dispatch layer
//!
//! Every operation consults the virtual state first and falls back to the
//! injected real filesystem on a miss. A path that is virtual never reaches
//! the real filesystem: virtual entries shadow real state at the same
//! resolved path. Misses delegate with the real operation's own arguments
//! and error semantics.

use bytes::Bytes;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::config::DirListing;
use crate::manifest::ResourceEntry;
use crate::overlay::context::OverlayContext;
use crate::overlay::paths;
use crate::overlay::real::{OsFilesystem, RealFilesystem};
use crate::overlay::stat::FileStat;
use crate::overlay::stream::{AsyncFileStream, AsyncResourceReader, FileStream, ResourceReader};

/// The overlay filesystem: virtual-first dispatch with real fallback
pub struct OverlayFs<R: RealFilesystem = OsFilesystem> {
    ctx: Arc<OverlayContext>,
    real: R,
}

impl OverlayFs<OsFilesystem> {
    /// Overlay backed by the operating system's filesystem
    pub fn new(ctx: Arc<OverlayContext>) -> Self {
        Self::with_real(ctx, OsFilesystem)
    }
}

impl<R: RealFilesystem> OverlayFs<R> {
    /// Overlay with an injected real-filesystem strategy
    pub fn with_real(ctx: Arc<OverlayContext>, real: R) -> Self {
        OverlayFs { ctx, real }
    }

    /// Shared overlay state
    pub fn context(&self) -> &OverlayContext {
        &self.ctx
    }

    /// The injected real-filesystem strategy
    pub fn real(&self) -> &R {
        &self.real
    }

    // Absolute position of an entry's window within the container.
    fn window(&self, entry: ResourceEntry) -> (u64, u64) {
        (
            self.ctx.layout().resource_start + entry.offset,
            entry.length,
        )
    }

    /// Whether the path exists, virtually or on disk
    pub fn exists(&self, path: &Path) -> bool {
        self.ctx.ensure_expanded();
        if self.ctx.is_virtual(path) {
            return true;
        }
        self.real.exists(path)
    }

    /// Whether the path exists, virtually or on disk
    pub async fn exists_async(&self, path: &Path) -> bool {
        self.ctx.ensure_expanded();
        if self.ctx.is_virtual(path) {
            // in-memory hits still complete on a later tick, like the real
            // operation they stand in for
            tokio::task::yield_now().await;
            return true;
        }
        self.real.exists_async(path).await
    }

    /// Metadata: synthesized for virtual hits, real otherwise.
    ///
    /// Does not force alias expansion; file hits work from the verbatim
    /// manifest, directory hits require that expansion already ran.
    pub fn stat(&self, path: &Path) -> io::Result<FileStat> {
        if let Some(stat) = self.ctx.stat_virtual(path) {
            debug!(path = %path.display(), "stat (virtual)");
            return Ok(stat);
        }
        self.real.metadata(path).map(|meta| FileStat::from_metadata(&meta))
    }

    /// Metadata: synthesized for virtual hits, real otherwise
    pub async fn stat_async(&self, path: &Path) -> io::Result<FileStat> {
        if let Some(stat) = self.ctx.stat_virtual(path) {
            tokio::task::yield_now().await;
            return Ok(stat);
        }
        self.real
            .metadata_async(path)
            .await
            .map(|meta| FileStat::from_metadata(&meta))
    }

    /// Real-path resolution.
    ///
    /// An exact, literal manifest key is already canonical and returns
    /// unchanged; every other path, including one that would only hit after
    /// normalization, resolves through the real filesystem.
    pub fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.ctx.ensure_expanded();
        if self.ctx.entry_literal(path).is_some() {
            return Ok(path.to_path_buf());
        }
        self.real.canonicalize(path)
    }

    /// Real-path resolution
    pub async fn canonicalize_async(&self, path: &Path) -> io::Result<PathBuf> {
        self.ctx.ensure_expanded();
        if self.ctx.entry_literal(path).is_some() {
            tokio::task::yield_now().await;
            return Ok(path.to_path_buf());
        }
        self.real.canonicalize_async(path).await
    }

    /// Directory listing: synthesized children for a virtual directory,
    /// real read_dir otherwise.
    ///
    /// Under the default `VirtualOnly` policy a virtual hit never consults
    /// the real filesystem; `MergedWithReal` unions in the real entries,
    /// synthesized names first, and treats a real listing failure as an
    /// empty real side (the directory may exist only virtually).
    pub fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        self.ctx.ensure_expanded();
        match self.ctx.dir_children(path) {
            Some(children) => {
                debug!(path = %path.display(), entries = children.len(), "read_dir (virtual)");
                let real = match self.ctx.config().dir_listing {
                    DirListing::VirtualOnly => Vec::new(),
                    DirListing::MergedWithReal => self.real.read_dir(path).unwrap_or_default(),
                };
                Ok(merge_listing(children, real))
            }
            None => self.real.read_dir(path),
        }
    }

    /// Directory listing: synthesized children for a virtual directory,
    /// real read_dir otherwise
    pub async fn read_dir_async(&self, path: &Path) -> io::Result<Vec<OsString>> {
        self.ctx.ensure_expanded();
        match self.ctx.dir_children(path) {
            Some(children) => {
                let real = match self.ctx.config().dir_listing {
                    DirListing::VirtualOnly => Vec::new(),
                    DirListing::MergedWithReal => {
                        self.real.read_dir_async(path).await.unwrap_or_default()
                    }
                };
                tokio::task::yield_now().await;
                Ok(merge_listing(children, real))
            }
            None => self.real.read_dir_async(path).await,
        }
    }

    /// Whole-file read, raw bytes.
    ///
    /// Hits on the literal key or its absolutized form; the window
    /// `[resource_start + offset, + length)` is read from a descriptor
    /// opened for this call alone.
    pub fn read(&self, path: &Path) -> io::Result<Bytes> {
        self.ctx.ensure_expanded();
        match self.ctx.entry(path) {
            Some(entry) => {
                let (start, length) = self.window(entry);
                let mut reader = ResourceReader::open(self.ctx.container(), start, length)?;
                let mut buf = Vec::with_capacity(length as usize);
                reader.read_to_end(&mut buf)?;
                if (buf.len() as u64) < length {
                    return Err(short_read(path, length, buf.len()));
                }
                Ok(Bytes::from(buf))
            }
            None => self.real.read(path),
        }
    }

    /// Whole-file read, raw bytes
    pub async fn read_async(&self, path: &Path) -> io::Result<Bytes> {
        self.ctx.ensure_expanded();
        match self.ctx.entry(path) {
            Some(entry) => {
                let (start, length) = self.window(entry);
                let mut reader =
                    AsyncResourceReader::open(self.ctx.container(), start, length).await?;
                let mut buf = Vec::with_capacity(length as usize);
                reader.read_to_end(&mut buf).await?;
                if (buf.len() as u64) < length {
                    return Err(short_read(path, length, buf.len()));
                }
                Ok(Bytes::from(buf))
            }
            None => self.real.read_async(path).await,
        }
    }

    /// Whole-file read decoded as UTF-8 text
    pub fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.ctx.ensure_expanded();
        if self.ctx.entry(path).is_some() {
            let bytes = self.read(path)?;
            return decode_utf8(bytes);
        }
        self.real.read_to_string(path)
    }

    /// Whole-file read decoded as UTF-8 text
    pub async fn read_to_string_async(&self, path: &Path) -> io::Result<String> {
        self.ctx.ensure_expanded();
        if self.ctx.entry(path).is_some() {
            let bytes = self.read_async(path).await?;
            return decode_utf8(bytes);
        }
        self.real.read_to_string_async(path).await
    }

    /// Streaming read windowed to the resource's byte range, or the real
    /// file on a miss
    pub fn open_stream(&self, path: &Path) -> io::Result<FileStream> {
        self.ctx.ensure_expanded();
        match self.ctx.entry(path) {
            Some(entry) => {
                let (start, length) = self.window(entry);
                ResourceReader::open(self.ctx.container(), start, length)
                    .map(FileStream::Resource)
            }
            None => self.real.open(path).map(FileStream::Real),
        }
    }

    /// Streaming read windowed to the resource's byte range, or the real
    /// file on a miss
    pub async fn open_stream_async(&self, path: &Path) -> io::Result<AsyncFileStream> {
        self.ctx.ensure_expanded();
        match self.ctx.entry(path) {
            Some(entry) => {
                let (start, length) = self.window(entry);
                AsyncResourceReader::open(self.ctx.container(), start, length)
                    .await
                    .map(AsyncFileStream::Resource)
            }
            None => self.real.open_async(path).await.map(AsyncFileStream::Real),
        }
    }

    /// Resolved absolute form of a path, as the overlay sees it
    pub fn resolve(&self, path: &Path) -> PathBuf {
        paths::absolutize(path)
    }
}

// Synthesized names first, then real names not shadowed by them.
fn merge_listing(children: &BTreeSet<OsString>, real: Vec<OsString>) -> Vec<OsString> {
    let mut names: Vec<OsString> = children.iter().cloned().collect();
    for name in real {
        if !children.contains(name.as_os_str()) {
            names.push(name);
        }
    }
    names
}

fn short_read(path: &Path, expected: u64, got: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!(
            "resource {} truncated: expected {} bytes, container held {}",
            path.display(),
            expected,
            got
        ),
    )
}

fn decode_utf8(bytes: Bytes) -> io::Result<String> {
    String::from_utf8(bytes.into()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
