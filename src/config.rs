//! Configuration for the overlay

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Listing policy for synthesized directories.
///
/// A path that misses the directory index always delegates to the real
/// `read_dir`; this policy only governs what a virtual directory hit returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DirListing {
    /// Return only the synthesized children. Virtual state shadows any real
    /// directory at the same path.
    #[default]
    VirtualOnly,

    /// Union the synthesized children with the real directory's entries at
    /// the same path, deduplicated; synthesized names win.
    MergedWithReal,
}

/// Overlay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OverlayConfig {
    /// Container file holding the resource region. `None` means the running
    /// executable, which is the production case; tests point this at a
    /// scratch file.
    pub container: Option<PathBuf>,

    /// Listing policy for synthesized directories
    pub dir_listing: DirListing,
}

impl OverlayConfig {
    /// Configuration reading resources from the given container file
    /// instead of the running executable.
    pub fn with_container(container: impl Into<PathBuf>) -> Self {
        OverlayConfig {
            container: Some(container.into()),
            ..Default::default()
        }
    }
}
