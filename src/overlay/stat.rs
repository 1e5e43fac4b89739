//! File metadata for overlay results
//!
//! Virtual entries have no on-disk inode; their stat results are derived
//! from the pack-time template with size and kind injected per entry. Real
//! fallback hits convert from `std::fs::Metadata` so every stat operation
//! has a single return type.

use std::time::SystemTime;

use crate::manifest::{ResourceEntry, TemplateStat};

/// Placeholder owner for synthesized entries
pub const VIRTUAL_UID: u32 = 123;
/// Placeholder group for synthesized entries
pub const VIRTUAL_GID: u32 = 500;
/// Block size reported for synthesized entries
pub const VIRTUAL_BLKSIZE: u32 = 4096;

/// File type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Regular file
    RegularFile,
    /// Directory
    Directory,
    /// Symbolic link (real fallback hits only; nothing virtual is a symlink)
    Symlink,
}

/// Metadata record returned by overlay stat operations
#[derive(Debug, Clone)]
pub struct FileStat {
    /// File type
    pub kind: FileKind,
    /// Size in bytes
    pub size: u64,
    /// Permission bits
    pub perm: u16,
    /// Hard link count
    pub nlink: u64,
    /// Owner
    pub uid: u32,
    /// Group
    pub gid: u32,
    /// Device id
    pub dev: u64,
    /// Inode number
    pub ino: u64,
    /// Preferred I/O block size
    pub blksize: u32,
    /// Allocated 512-byte blocks
    pub blocks: u64,
    /// Access time
    pub atime: SystemTime,
    /// Modification time
    pub mtime: SystemTime,
    /// Change time
    pub ctime: SystemTime,
    /// Creation time
    pub birthtime: SystemTime,
}

impl FileStat {
    /// Synthesized metadata for a packed file
    pub fn virtual_file(template: &TemplateStat, entry: &ResourceEntry) -> Self {
        FileStat {
            kind: FileKind::RegularFile,
            size: entry.length,
            ..Self::virtual_base(template)
        }
    }

    /// Synthesized metadata for a directory inferred from packed paths
    pub fn virtual_dir(template: &TemplateStat) -> Self {
        FileStat {
            kind: FileKind::Directory,
            size: 0,
            ..Self::virtual_base(template)
        }
    }

    // Shared template-derived fields. Identity fields are fixed placeholders:
    // nothing virtual has a device, inode, or link count.
    fn virtual_base(template: &TemplateStat) -> Self {
        FileStat {
            kind: FileKind::RegularFile,
            size: 0,
            perm: (template.mode & 0o7777) as u16,
            nlink: 0,
            uid: VIRTUAL_UID,
            gid: VIRTUAL_GID,
            dev: 0,
            ino: 0,
            blksize: VIRTUAL_BLKSIZE,
            blocks: 0,
            atime: template.atime.into(),
            mtime: template.mtime.into(),
            ctime: template.ctime.into(),
            birthtime: template.birthtime.into(),
        }
    }

    /// Convert from real filesystem metadata
    #[cfg(unix)]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        FileStat {
            kind: Self::kind_of(meta),
            size: meta.len(),
            perm: (meta.mode() & 0o7777) as u16,
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            dev: meta.dev(),
            ino: meta.ino(),
            blksize: meta.blksize() as u32,
            blocks: meta.blocks(),
            atime: meta.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ctime: SystemTime::UNIX_EPOCH
                + std::time::Duration::from_secs(meta.ctime().max(0) as u64),
            birthtime: meta.created().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Convert from real filesystem metadata
    #[cfg(not(unix))]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        FileStat {
            kind: Self::kind_of(meta),
            size: meta.len(),
            perm: if meta.permissions().readonly() { 0o444 } else { 0o644 },
            nlink: 1,
            uid: 0,
            gid: 0,
            dev: 0,
            ino: 0,
            blksize: VIRTUAL_BLKSIZE,
            blocks: 0,
            atime: meta.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ctime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            birthtime: meta.created().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    fn kind_of(meta: &std::fs::Metadata) -> FileKind {
        if meta.is_dir() {
            FileKind::Directory
        } else if meta.is_symlink() {
            FileKind::Symlink
        } else {
            FileKind::RegularFile
        }
    }

    /// Whether this is a regular file
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::RegularFile
    }

    /// Whether this is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_file_shape() {
        let template = TemplateStat::default();
        let stat = FileStat::virtual_file(&template, &ResourceEntry::new(64, 1500));

        assert!(stat.is_file());
        assert!(!stat.is_dir());
        assert_eq!(stat.size, 1500);
        assert_eq!(stat.uid, VIRTUAL_UID);
        assert_eq!(stat.gid, VIRTUAL_GID);
        assert_eq!(stat.dev, 0);
        assert_eq!(stat.ino, 0);
        assert_eq!(stat.nlink, 0);
        assert_eq!(stat.blksize, VIRTUAL_BLKSIZE);
    }

    #[test]
    fn test_virtual_dir_shape() {
        let stat = FileStat::virtual_dir(&TemplateStat::default());

        assert!(stat.is_dir());
        assert!(!stat.is_file());
        assert_eq!(stat.size, 0);
        assert_eq!(stat.blocks, 0);
    }

    #[test]
    fn test_template_times_copied() {
        let template = TemplateStat {
            mtime: chrono::DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                .unwrap()
                .into(),
            ..TemplateStat::default()
        };
        let stat = FileStat::virtual_dir(&template);

        assert_eq!(SystemTime::from(template.mtime), stat.mtime);
        assert_eq!(stat.atime, SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_from_real_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("real.txt");
        std::fs::write(&file, b"12345").unwrap();

        let stat = FileStat::from_metadata(&std::fs::metadata(&file).unwrap());
        assert!(stat.is_file());
        assert_eq!(stat.size, 5);
    }
}
