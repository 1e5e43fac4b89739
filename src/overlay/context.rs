//! Shared overlay state
//!
//! [`OverlayContext`] owns the packed manifest, the container location, and
//! the lazily built alias/directory state. Expansion runs at most once for
//! the life of the process; everything it builds is immutable afterwards,
//! so readers on any thread see one consistent view.

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::OverlayConfig;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, PackedResources, ResourceEntry, ResourceLayout};
use crate::overlay::paths;
use crate::overlay::stat::FileStat;

/// Alias-expanded overlay state: the manifest with every derived path form
/// registered, plus the directory tree synthesized from manifest ancestors.
#[derive(Debug)]
pub(crate) struct Expanded {
    /// Every path form (original, absolute, long, normalized) to its entry
    pub(crate) files: HashMap<PathBuf, ResourceEntry>,
    /// Resolved directory path to immediate child basenames
    pub(crate) directories: HashMap<PathBuf, BTreeSet<OsString>>,
}

/// Shared, read-only overlay state
pub struct OverlayContext {
    layout: ResourceLayout,
    seed: Manifest,
    container: PathBuf,
    config: OverlayConfig,
    expanded: OnceLock<Expanded>,
}

impl OverlayContext {
    /// Build the context from the packager's payload.
    ///
    /// Resolves the container file once: the configured override, or the
    /// running executable, which is where the resource region lives in the
    /// production case.
    pub fn new(resources: PackedResources, config: OverlayConfig) -> Result<Self> {
        let container = match &config.container {
            Some(path) => path.clone(),
            None => std::env::current_exe().map_err(|e| Error::Container(e.to_string()))?,
        };

        Ok(OverlayContext {
            layout: resources.layout,
            seed: resources.resources,
            container,
            config,
            expanded: OnceLock::new(),
        })
    }

    /// Resource region layout
    pub fn layout(&self) -> &ResourceLayout {
        &self.layout
    }

    /// Overlay configuration
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Container file holding the resource region
    pub fn container(&self) -> &Path {
        &self.container
    }

    /// Run alias expansion if it has not run yet. Idempotent: later calls
    /// (from any thread) are no-ops against the same built state.
    pub fn ensure_expanded(&self) {
        let _ = self.expanded();
    }

    pub(crate) fn expanded(&self) -> &Expanded {
        self.expanded.get_or_init(|| expand(&self.seed))
    }

    /// Entry for the literal key or its absolutized form
    pub(crate) fn entry(&self, path: &Path) -> Option<ResourceEntry> {
        let files = &self.expanded().files;
        files
            .get(path)
            .or_else(|| files.get(&paths::absolutize(path)))
            .copied()
    }

    /// Entry for the exact literal key only. Virtual paths are already
    /// canonical, so real-path resolution and the resolver fast path match
    /// on nothing looser.
    pub(crate) fn entry_literal(&self, path: &Path) -> Option<ResourceEntry> {
        self.expanded().files.get(path).copied()
    }

    /// Child basenames of a synthesized directory, by resolved path
    pub(crate) fn dir_children(&self, path: &Path) -> Option<&BTreeSet<OsString>> {
        self.expanded().directories.get(&paths::absolutize(path))
    }

    /// Whether the exact literal key names a synthesized directory
    pub(crate) fn is_dir_literal(&self, path: &Path) -> bool {
        self.expanded().directories.contains_key(path)
    }

    /// Whether the resolved path names any virtual entry, file or directory
    pub(crate) fn is_virtual(&self, path: &Path) -> bool {
        let resolved = paths::absolutize(path);
        let state = self.expanded();
        state.files.contains_key(&resolved) || state.directories.contains_key(&resolved)
    }

    /// Synthesized metadata for a virtual path, or `None` for fallback.
    ///
    /// Never forces expansion: the expanded state is consulted only if
    /// already built, and file hits come from the verbatim manifest
    /// otherwise. Directory hits therefore require that some other
    /// operation has triggered expansion first.
    pub fn stat_virtual(&self, path: &Path) -> Option<FileStat> {
        let resolved = paths::absolutize(path);
        match self.expanded.get() {
            Some(state) => {
                if state.directories.contains_key(&resolved) {
                    return Some(FileStat::virtual_dir(&self.layout.stat));
                }
                state
                    .files
                    .get(&resolved)
                    .map(|entry| FileStat::virtual_file(&self.layout.stat, entry))
            }
            None => self
                .seed
                .get(&resolved)
                .map(|entry| FileStat::virtual_file(&self.layout.stat, entry)),
        }
    }
}

impl std::fmt::Debug for OverlayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayContext")
            .field("container", &self.container)
            .field("seed_entries", &self.seed.len())
            .field("expanded", &self.expanded.get().is_some())
            .finish()
    }
}

/// One-shot alias expansion.
///
/// For every manifest key, register its absolute, extended-length, and
/// normalized forms against the same entry (first writer wins, so
/// pre-seeded aliases survive), then walk the absolute path's ancestors,
/// recording each level's child basename. The walk stops at the root,
/// where a path has no parent to ascend to.
fn expand(seed: &Manifest) -> Expanded {
    let mut files: HashMap<PathBuf, ResourceEntry> = HashMap::new();
    let mut directories: HashMap<PathBuf, BTreeSet<OsString>> = HashMap::new();

    for (key, entry) in seed.iter() {
        files.entry(key.clone()).or_insert(*entry);

        let absolute = paths::absolutize(key);
        files.entry(absolute.clone()).or_insert(*entry);
        if let Some(long) = paths::long_path(&absolute) {
            files.entry(long).or_insert(*entry);
        }
        files.entry(paths::normalize(key)).or_insert(*entry);

        let mut prev = absolute;
        while let Some(parent) = prev.parent().map(Path::to_path_buf) {
            match prev.file_name() {
                Some(name) => {
                    directories
                        .entry(parent.clone())
                        .or_default()
                        .insert(name.to_os_string());
                }
                None => break,
            }
            prev = parent;
        }
    }

    // Extended-length aliases for the synthesized directories, after the
    // walk so each alias sees the directory's complete child set.
    let long_aliases: Vec<(PathBuf, BTreeSet<OsString>)> = directories
        .iter()
        .filter_map(|(dir, children)| paths::long_path(dir).map(|long| (long, children.clone())))
        .collect();
    for (long, children) in long_aliases {
        directories.entry(long).or_insert(children);
    }

    Expanded { files, directories }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TemplateStat;

    fn context_for(entries: &[(&str, u64, u64)]) -> OverlayContext {
        let manifest: Manifest = entries
            .iter()
            .map(|(path, offset, length)| {
                (PathBuf::from(path), ResourceEntry::new(*offset, *length))
            })
            .collect();
        let packed = PackedResources::new(ResourceLayout::new(0), manifest);
        OverlayContext::new(packed, OverlayConfig::with_container("/dev/null")).unwrap()
    }

    #[test]
    fn test_alias_registration() {
        let ctx = context_for(&[("/app/./lib/../main.js", 0, 9)]);
        ctx.ensure_expanded();

        // original key, absolutized form, and normalized form all resolve
        assert!(ctx.entry(Path::new("/app/./lib/../main.js")).is_some());
        assert!(ctx.entry(Path::new("/app/main.js")).is_some());
        assert_eq!(ctx.entry(Path::new("/app/main.js")).unwrap().length, 9);
    }

    #[test]
    fn test_directory_index_contents() {
        let ctx = context_for(&[("/a/b/c.txt", 0, 1), ("/a/b/d.txt", 1, 1)]);
        ctx.ensure_expanded();

        let b_children = ctx.dir_children(Path::new("/a/b")).unwrap();
        let names: Vec<_> = b_children.iter().map(|n| n.to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["c.txt", "d.txt"]);

        let a_children = ctx.dir_children(Path::new("/a")).unwrap();
        assert_eq!(a_children.len(), 1);
        assert!(a_children.contains(OsString::from("b").as_os_str()));

        // the root itself is indexed too, holding the top-level name
        assert!(ctx.dir_children(Path::new("/")).unwrap().contains(OsString::from("a").as_os_str()));
    }

    #[test]
    fn test_expansion_idempotent() {
        let ctx = context_for(&[("/a/b/c.txt", 0, 1)]);
        ctx.ensure_expanded();
        let files_before = ctx.expanded().files.len();
        let dirs_before = ctx.expanded().directories.len();

        ctx.ensure_expanded();
        ctx.ensure_expanded();
        assert_eq!(ctx.expanded().files.len(), files_before);
        assert_eq!(ctx.expanded().directories.len(), dirs_before);
    }

    #[test]
    fn test_deep_walk_terminates() {
        let deep = format!("/{}/leaf.txt", vec!["d"; 64].join("/"));
        let ctx = context_for(&[(&deep, 0, 1)]);
        ctx.ensure_expanded();

        // 64 nested directories plus the root
        assert_eq!(ctx.expanded().directories.len(), 65);
    }

    #[test]
    fn test_stat_virtual_pre_expansion_file_hit() {
        let ctx = context_for(&[("/app/main.js", 0, 7)]);

        // no expansion has run; the verbatim manifest still answers
        let stat = ctx.stat_virtual(Path::new("/app/main.js")).unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.size, 7);

        // directories are unknown until expansion
        assert!(ctx.stat_virtual(Path::new("/app")).is_none());

        ctx.ensure_expanded();
        assert!(ctx.stat_virtual(Path::new("/app")).unwrap().is_dir());
    }

    #[test]
    fn test_stat_virtual_sizes() {
        let ctx = context_for(&[("/data/blob.bin", 16, 1024)]);
        ctx.ensure_expanded();

        assert_eq!(ctx.stat_virtual(Path::new("/data/blob.bin")).unwrap().size, 1024);
        assert_eq!(ctx.stat_virtual(Path::new("/data")).unwrap().size, 0);
    }

    #[test]
    fn test_template_flows_into_stats() {
        let manifest: Manifest = [(PathBuf::from("/x/y.txt"), ResourceEntry::new(0, 3))]
            .into_iter()
            .collect();
        let mut layout = ResourceLayout::new(0);
        layout.stat = TemplateStat {
            mode: 0o600,
            ..TemplateStat::default()
        };
        let ctx = OverlayContext::new(
            PackedResources::new(layout, manifest),
            OverlayConfig::with_container("/dev/null"),
        )
        .unwrap();
        ctx.ensure_expanded();

        assert_eq!(ctx.stat_virtual(Path::new("/x/y.txt")).unwrap().perm, 0o600);
    }
}
