//! packfs - files packed into the running executable, served as a filesystem
//!
//! A packager writes a set of files into a resource region of an executable
//! and records a manifest of logical path to byte range. This library makes
//! those entries look like ordinary files and directories to any code that
//! reads through its overlay: existence checks, stat, directory listings,
//! whole-file and streaming reads, and real-path resolution, each with
//! synchronous and asynchronous forms, all falling back to the real
//! filesystem for paths the manifest does not know.
//!
//! ```no_run
//! use std::sync::Arc;
//! use packfs::prelude::*;
//!
//! # fn main() -> packfs::Result<()> {
//! // payload embedded by the packager; absent is fatal
//! let packed = PackedResources::from_embedded(load_payload())?;
//! let ctx = Arc::new(OverlayContext::new(packed, OverlayConfig::default())?);
//! let overlay = OverlayFs::new(ctx);
//!
//! let source = overlay.read_to_string("/app/index.js".as_ref())?;
//! # let _ = source;
//! # Ok(())
//! # }
//! # fn load_payload() -> Option<&'static [u8]> { None }
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod overlay;
pub mod resolver;

pub use config::{DirListing, OverlayConfig};
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{DirListing, OverlayConfig};
    pub use crate::error::{Error, Result};
    pub use crate::manifest::{Manifest, PackedResources, ResourceEntry, ResourceLayout};
    pub use crate::overlay::{FileStat, OverlayContext, OverlayFs};
}
