//! Virtual filesystem overlay
//!
//! Presents the packed resources as ordinary files and directories:
//! - Paths named by the manifest resolve to byte ranges in the container
//! - Ancestor directories are synthesized from the manifest's paths alone
//! - Everything else falls through to the real filesystem unchanged
//!
//! The overlay is read-only; nothing mutates the manifest or the
//! synthesized tree after the one-shot alias expansion.

mod context;
mod filesystem;
pub(crate) mod paths;
mod real;
mod stat;
mod stream;

pub use context::OverlayContext;
pub use filesystem::OverlayFs;
pub use real::{OsFilesystem, RealFilesystem};
pub use stat::{FileKind, FileStat, VIRTUAL_BLKSIZE, VIRTUAL_GID, VIRTUAL_UID};
pub use stream::{AsyncFileStream, AsyncResourceReader, FileStream, ResourceReader};
