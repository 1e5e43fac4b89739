//! Module-resolver fast path
//!
//! Hosts that embed a module loader probe and read candidate paths at a
//! rate where full dispatch overhead matters. These two hooks wrap the
//! resolver's original steps and short-circuit to the overlay for packed
//! paths. They are purely an optimization: the resolver's eventual
//! filesystem calls go through the overlay anyway, so correctness does not
//! depend on them being installed.

use std::io;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::overlay::{OverlayFs, RealFilesystem};

/// Result of a module stat probe, mirroring the resolver's numeric
/// convention: `0` for a file, `1` for a directory, negative errno on
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStat {
    /// Path exists as a file
    File,
    /// Path exists as a directory
    Directory,
    /// Probe failed with the given negative errno
    Failed(i32),
}

impl ModuleStat {
    /// Numeric sentinel the resolver convention uses
    pub fn code(self) -> i32 {
        match self {
            ModuleStat::File => 0,
            ModuleStat::Directory => 1,
            ModuleStat::Failed(code) => code,
        }
    }

    /// Decode the resolver's numeric sentinel
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ModuleStat::File,
            1 => ModuleStat::Directory,
            other => ModuleStat::Failed(other),
        }
    }
}

static TRACE: OnceLock<bool> = OnceLock::new();

// The enable flag is read once; a disabled decision is permanent for the
// process.
fn trace_enabled() -> bool {
    *TRACE.get_or_init(|| {
        std::env::var("PACKFS_DEBUG")
            .map(|value| value.to_ascii_lowercase().contains("resolver"))
            .unwrap_or(false)
    })
}

/// Read a module's source text.
///
/// An exact, literal manifest key reads from the container; anything else
/// delegates to the resolver's original step with the same argument.
pub fn read_module_source<R, F>(
    overlay: &OverlayFs<R>,
    path: &Path,
    original: F,
) -> io::Result<String>
where
    R: RealFilesystem,
    F: FnOnce(&Path) -> io::Result<String>,
{
    overlay.context().ensure_expanded();
    if overlay.context().entry_literal(path).is_some() {
        if trace_enabled() {
            debug!(target: "packfs::resolver", path = %path.display(), "read (hit)");
        }
        return overlay.read_to_string(path);
    }
    if trace_enabled() {
        debug!(target: "packfs::resolver", path = %path.display(), "read (miss)");
    }
    original(path)
}

/// Stat-probe a module path.
///
/// Literal manifest keys are files, literal directory-index keys are
/// directories; anything else delegates to the resolver's original step
/// and logs the outcome it reported.
pub fn stat_module_path<R, F>(overlay: &OverlayFs<R>, path: &Path, original: F) -> ModuleStat
where
    R: RealFilesystem,
    F: FnOnce(&Path) -> ModuleStat,
{
    overlay.context().ensure_expanded();
    if overlay.context().entry_literal(path).is_some() {
        if trace_enabled() {
            debug!(target: "packfs::resolver", path = %path.display(), code = 0, "stat (hit)");
        }
        return ModuleStat::File;
    }
    if overlay.context().is_dir_literal(path) {
        if trace_enabled() {
            debug!(target: "packfs::resolver", path = %path.display(), code = 1, "stat dir (hit)");
        }
        return ModuleStat::Directory;
    }

    let result = original(path);
    if trace_enabled() {
        match result {
            ModuleStat::File => {
                debug!(target: "packfs::resolver", path = %path.display(), code = 0, "stat (miss)")
            }
            ModuleStat::Directory => {
                debug!(target: "packfs::resolver", path = %path.display(), code = 1, "stat dir (miss)")
            }
            ModuleStat::Failed(code) => {
                debug!(target: "packfs::resolver", path = %path.display(), code, "stat (fail)")
            }
        }
    }
    result
}

/// Stored hook reading a module's source, given the path and the
/// resolver's original step
pub type ReadSourceHook =
    Box<dyn Fn(&Path, &dyn Fn(&Path) -> io::Result<String>) -> io::Result<String> + Send + Sync>;

/// Stored hook stat-probing a module path, given the path and the
/// resolver's original step
pub type StatPathHook = Box<dyn Fn(&Path, &dyn Fn(&Path) -> ModuleStat) -> ModuleStat + Send + Sync>;

/// Named hook slots supplied by the host's module resolver
#[derive(Default)]
pub struct HookTable {
    /// Slot for the read-module-source step
    pub read_source: Option<ReadSourceHook>,
    /// Slot for the stat-module-path step
    pub stat_path: Option<StatPathHook>,
    /// Discovery flag the host sets when advertising the table; cleared on
    /// installation so later consumers do not see it
    pub advertised: bool,
}

impl HookTable {
    /// Empty table, advertised to installers
    pub fn advertised() -> Self {
        HookTable {
            advertised: true,
            ..Default::default()
        }
    }
}

/// Install the fast-path hooks into the host's table.
///
/// A host without a hook table skips installation without error.
pub fn install_hooks<R>(table: Option<&mut HookTable>, overlay: Arc<OverlayFs<R>>)
where
    R: RealFilesystem + 'static,
{
    let Some(table) = table else {
        return;
    };

    let read_overlay = Arc::clone(&overlay);
    table.read_source = Some(Box::new(move |path, original| {
        read_module_source(&read_overlay, path, |p| original(p))
    }));
    table.stat_path = Some(Box::new(move |path, original| {
        stat_module_path(&overlay, path, |p| original(p))
    }));
    table.advertised = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::manifest::{Manifest, PackedResources, ResourceEntry, ResourceLayout};
    use crate::overlay::OverlayContext;
    use std::fs;
    use tempfile::TempDir;

    fn overlay_with(source: &[u8], key: &str) -> (TempDir, Arc<OverlayFs>) {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("container.bin");
        fs::write(&container, source).unwrap();

        let mut manifest = Manifest::new();
        manifest.insert(key, ResourceEntry::new(0, source.len() as u64));
        let packed = PackedResources::new(ResourceLayout::new(0), manifest);
        let ctx = Arc::new(
            OverlayContext::new(packed, OverlayConfig::with_container(&container)).unwrap(),
        );
        (dir, Arc::new(OverlayFs::new(ctx)))
    }

    #[test]
    fn test_sentinel_codes() {
        assert_eq!(ModuleStat::File.code(), 0);
        assert_eq!(ModuleStat::Directory.code(), 1);
        assert_eq!(ModuleStat::Failed(-2).code(), -2);
        assert_eq!(ModuleStat::from_code(1), ModuleStat::Directory);
        assert_eq!(ModuleStat::from_code(-13), ModuleStat::Failed(-13));
    }

    #[test]
    fn test_read_module_source_hit() {
        let (_dir, overlay) = overlay_with(b"module.exports = 1", "/virtual/mod.js");

        let source = read_module_source(&overlay, Path::new("/virtual/mod.js"), |_| {
            panic!("original step must not run on a hit")
        })
        .unwrap();
        assert_eq!(source, "module.exports = 1");
    }

    #[test]
    fn test_read_module_source_miss_delegates() {
        let (_dir, overlay) = overlay_with(b"x", "/virtual/mod.js");

        let source = read_module_source(&overlay, Path::new("/elsewhere/mod.js"), |path| {
            Ok(format!("original read {}", path.display()))
        })
        .unwrap();
        assert_eq!(source, "original read /elsewhere/mod.js");
    }

    #[test]
    fn test_stat_module_path_sentinels() {
        let (_dir, overlay) = overlay_with(b"x", "/virtual/pkg/mod.js");

        assert_eq!(
            stat_module_path(&overlay, Path::new("/virtual/pkg/mod.js"), |_| {
                panic!("original step must not run on a hit")
            }),
            ModuleStat::File
        );
        assert_eq!(
            stat_module_path(&overlay, Path::new("/virtual/pkg"), |_| {
                panic!("original step must not run on a hit")
            }),
            ModuleStat::Directory
        );
        assert_eq!(
            stat_module_path(&overlay, Path::new("/missing"), |_| ModuleStat::Failed(-2)),
            ModuleStat::Failed(-2)
        );
    }

    #[test]
    fn test_install_hooks_fills_slots_and_clears_flag() {
        let (_dir, overlay) = overlay_with(b"source", "/virtual/mod.js");

        let mut table = HookTable::advertised();
        assert!(table.advertised);

        install_hooks(Some(&mut table), Arc::clone(&overlay));
        assert!(!table.advertised);

        let read_hook = table.read_source.as_ref().unwrap();
        let source = read_hook(Path::new("/virtual/mod.js"), &|_| unreachable!()).unwrap();
        assert_eq!(source, "source");

        let stat_hook = table.stat_path.as_ref().unwrap();
        assert_eq!(
            stat_hook(Path::new("/virtual/mod.js"), &|_| unreachable!()),
            ModuleStat::File
        );
        assert_eq!(
            stat_hook(Path::new("/not/packed"), &|_| ModuleStat::Failed(-2)),
            ModuleStat::Failed(-2)
        );
    }

    #[test]
    fn test_install_hooks_without_table_is_noop() {
        let (_dir, overlay) = overlay_with(b"x", "/virtual/mod.js");
        install_hooks(None, overlay);
    }
}
