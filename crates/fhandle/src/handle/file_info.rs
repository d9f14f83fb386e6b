use std::fmt;
use std::fs;
use std::time::SystemTime;
#[cfg(unix)]
use std::time::{Duration, UNIX_EPOCH};

/// Kind of filesystem object a handle or directory entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl From<fs::FileType> for FileKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Dir
        } else if file_type.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        }
    }
}

#[cfg(unix)]
impl From<rustix::fs::FileType> for FileKind {
    fn from(file_type: rustix::fs::FileType) -> Self {
        use rustix::fs::FileType;
        match file_type {
            FileType::RegularFile => FileKind::File,
            FileType::Directory => FileKind::Dir,
            FileType::Symlink => FileKind::Symlink,
            _ => FileKind::Other,
        }
    }
}

/// Permission bits of a file, including setuid, setgid and sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileMode(u32);

impl FileMode {
    pub const fn new(bits: u32) -> Self {
        Self(bits & 0o7777)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if no write bit is set for anyone.
    pub const fn is_readonly(self) -> bool {
        self.0 & 0o222 == 0
    }

    fn from_permissions(permissions: &fs::Permissions) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Self::new(permissions.mode())
        }
        #[cfg(not(unix))]
        {
            if permissions.readonly() {
                Self::new(0o444)
            } else {
                Self::new(0o666)
            }
        }
    }
}

impl From<u32> for FileMode {
    fn from(bits: u32) -> Self {
        Self::new(bits)
    }
}

/// Renders the permission bits the way `ls -l` does, e.g. `rwxr-xr-x`.
impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RWX: &[u8; 3] = b"rwx";
        for shift in [6, 3, 0] {
            for (i, c) in RWX.iter().enumerate() {
                let bit = 1 << (shift + 2 - i);
                let ch = if self.0 & bit != 0 { *c as char } else { '-' };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

/// Status information about a file, as returned by `stat` and directory listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the file.
    pub name: String,
    pub len: u64,
    pub mode: FileMode,
    pub kind: FileKind,
    pub modified: Option<SystemTime>,
}

impl FileInfo {
    pub fn from_metadata(name: impl Into<String>, metadata: &fs::Metadata) -> Self {
        Self {
            name: name.into(),
            len: metadata.len(),
            mode: FileMode::from_permissions(&metadata.permissions()),
            kind: metadata.file_type().into(),
            modified: metadata.modified().ok(),
        }
    }

    /// Build from a raw `stat` record, as returned for entries of a directory
    /// that is listed through its descriptor.
    #[cfg(unix)]
    pub fn from_stat(name: impl Into<String>, stat: &rustix::fs::Stat) -> Self {
        let raw_mode = stat.st_mode as rustix::fs::RawMode;
        let modified = u64::try_from(stat.st_mtime)
            .ok()
            .map(|secs| UNIX_EPOCH + Duration::new(secs, stat.st_mtime_nsec as u32));
        Self {
            name: name.into(),
            len: stat.st_size as u64,
            mode: FileMode::new(raw_mode as u32),
            kind: rustix::fs::FileType::from_raw_mode(raw_mode).into(),
            modified,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

/// Lightweight directory entry: a name and what kind of object it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirEntry {
    pub name: String,
    pub kind: FileKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

impl From<&FileInfo> for DirEntry {
    fn from(info: &FileInfo) -> Self {
        Self {
            name: info.name.clone(),
            kind: info.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn test_mode_display() {
        let rendered: Vec<String> = [0o755, 0o644, 0o600, 0o000, 0o4777]
            .into_iter()
            .map(|bits| FileMode::new(bits).to_string())
            .collect();
        expect![[r#"
            [
                "rwxr-xr-x",
                "rw-r--r--",
                "rw-------",
                "---------",
                "rwxrwxrwx",
            ]
        "#]]
        .assert_debug_eq(&rendered);
    }

    #[test]
    fn test_mode_masks_type_bits() {
        // 0o100644 is a regular file with rw-r--r--
        let mode = FileMode::from(0o100644);
        assert_eq!(mode.bits(), 0o644);
        assert!(!mode.is_readonly());
        assert!(FileMode::new(0o444).is_readonly());
    }

    #[test]
    fn test_file_info_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"12345").unwrap();

        let info = FileInfo::from_metadata("data.bin", &fs::metadata(&path).unwrap());
        assert_eq!(info.name, "data.bin");
        assert_eq!(info.len, 5);
        assert_eq!(info.kind, FileKind::File);
        assert!(!info.is_dir());
        assert!(info.modified.is_some());

        let dir_info = FileInfo::from_metadata("d", &fs::metadata(dir.path()).unwrap());
        assert!(dir_info.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_info_from_stat_matches_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"12345").unwrap();

        let stat = rustix::fs::stat(&path).unwrap();
        let from_stat = FileInfo::from_stat("data.bin", &stat);
        let from_metadata = FileInfo::from_metadata("data.bin", &fs::metadata(&path).unwrap());
        assert_eq!(from_stat, from_metadata);

        let dir_stat = rustix::fs::stat(dir.path()).unwrap();
        assert!(FileInfo::from_stat("d", &dir_stat).is_dir());
    }

    #[test]
    fn test_dir_entry_from_info() {
        let info = FileInfo {
            name: "sub".to_string(),
            len: 0,
            mode: FileMode::new(0o755),
            kind: FileKind::Dir,
            modified: None,
        };
        let entry = DirEntry::from(&info);
        assert_eq!(entry.name, "sub");
        assert!(entry.is_dir());
    }
}
