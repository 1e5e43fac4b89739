//! Resource region layout and the pack-time metadata template

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::manifest::Manifest;

/// Metadata template recorded by the packager.
///
/// Synthesized stat results copy these fields; only size and kind are
/// injected per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStat {
    /// Permission bits recorded at pack time
    pub mode: u32,
    /// Access time
    pub atime: DateTime<Utc>,
    /// Modification time
    pub mtime: DateTime<Utc>,
    /// Change time
    pub ctime: DateTime<Utc>,
    /// Creation time
    pub birthtime: DateTime<Utc>,
}

impl Default for TemplateStat {
    fn default() -> Self {
        TemplateStat {
            mode: 0o644,
            atime: DateTime::UNIX_EPOCH,
            mtime: DateTime::UNIX_EPOCH,
            ctime: DateTime::UNIX_EPOCH,
            birthtime: DateTime::UNIX_EPOCH,
        }
    }
}

/// Placement of the resource region within the container file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLayout {
    /// Byte offset where the resource region starts
    pub resource_start: u64,
    /// Template for synthesized metadata
    pub stat: TemplateStat,
}

impl ResourceLayout {
    /// Layout with the region starting at the given container offset and a
    /// default metadata template.
    pub fn new(resource_start: u64) -> Self {
        ResourceLayout {
            resource_start,
            stat: TemplateStat::default(),
        }
    }
}

/// The packager's complete payload: region layout plus the path manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedResources {
    /// Resource region placement and stat template
    pub layout: ResourceLayout,
    /// Logical path to byte range mapping
    pub resources: Manifest,
}

impl PackedResources {
    /// Assemble a payload from already-decoded parts
    pub fn new(layout: ResourceLayout, resources: Manifest) -> Self {
        PackedResources { layout, resources }
    }

    /// Decode the payload the packager embedded in the container.
    ///
    /// An absent payload is fatal: the overlay has no degraded mode without
    /// a manifest.
    pub fn from_embedded(payload: Option<&[u8]>) -> Result<Self> {
        let data = payload.ok_or_else(|| {
            Error::LayoutMissing("no packed-resource payload in container".to_string())
        })?;
        Ok(serde_json::from_slice(data)?)
    }
}
