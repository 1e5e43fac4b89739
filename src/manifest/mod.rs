//! Packed-resource manifest and container layout
//!
//! The packager writes every bundled file back-to-back into a resource
//! region of the container file and records, per logical path, the byte
//! range holding that file's contents. This module is the read side of that
//! record: the manifest map, the region layout, and the metadata template
//! used for synthesized stat results.

mod entry;
mod layout;

pub use entry::{Manifest, ResourceEntry};
pub use layout::{PackedResources, ResourceLayout, TemplateStat};
