/* 📖 # Why list directories through the descriptor?

The handle refers to whatever directory it was opened on, even after that
directory is renamed or another one takes its place at the old path. Reading
entries from the open descriptor keeps the listing tied to that directory,
the same way `fchdir` keeps chdir tied to it.

A listing may fail halfway through a chunk. The entries read so far are still
handed out, and the error is kept for the next call, so nothing the cursor
moved past is lost.
*/

use std::fs::File;
use std::io;

use super::file_info::{FileInfo, FileKind};

#[cfg(unix)]
pub(super) use unix::{DirCursor, ListedEntry};

#[cfg(not(unix))]
pub(super) use unsupported::{DirCursor, ListedEntry};

/// Record an error hit after `collected` entries were read in this call.
/// Returns it right away if there is nothing to hand out first.
#[cfg(unix)]
fn defer_error(
    pending: &mut Option<io::Error>,
    error: io::Error,
    collected: usize,
) -> io::Result<()> {
    if collected == 0 {
        return Err(error);
    }
    *pending = Some(error);
    Ok(())
}

#[cfg(unix)]
mod unix {
    use super::*;

    use rustix::fs::{AtFlags, Dir, DirEntry, FileType};

    /// Position of an in-progress listing of an open directory.
    #[derive(Debug)]
    pub(in crate::handle) struct DirCursor {
        dir: Dir,
        pending: Option<io::Error>,
    }

    /// One entry of the directory being listed.
    pub(in crate::handle) struct ListedEntry<'a> {
        dir: &'a Dir,
        entry: DirEntry,
    }

    impl DirCursor {
        /// Start listing the directory `file` refers to, from its first entry.
        pub(in crate::handle) fn open(file: &File) -> io::Result<Self> {
            Ok(Self {
                dir: Dir::read_from(file)?,
                pending: None,
            })
        }

        /// Read up to `limit` entries, skipping `.` and `..` and entries that
        /// vanish before `map` gets to them.
        pub(in crate::handle) fn next_chunk<T>(
            &mut self,
            limit: usize,
            map: impl Fn(&ListedEntry<'_>) -> io::Result<T>,
        ) -> io::Result<Vec<T>> {
            if let Some(error) = self.pending.take() {
                return Err(error);
            }

            let mut collected = Vec::new();
            while collected.len() < limit {
                let entry = match self.dir.read() {
                    None => break,
                    Some(Ok(entry)) => entry,
                    Some(Err(errno)) => {
                        defer_error(&mut self.pending, errno.into(), collected.len())?;
                        break;
                    }
                };
                let name = entry.file_name().to_bytes();
                if name == b"." || name == b".." {
                    continue;
                }

                let mapped = {
                    let listed = ListedEntry {
                        dir: &self.dir,
                        entry,
                    };
                    map(&listed)
                };
                match mapped {
                    Ok(item) => collected.push(item),
                    // Entry removed between listing and lstat
                    Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                    Err(e) => {
                        defer_error(&mut self.pending, e, collected.len())?;
                        break;
                    }
                }
            }
            Ok(collected)
        }
    }

    impl ListedEntry<'_> {
        pub(in crate::handle) fn name(&self) -> String {
            self.entry.file_name().to_string_lossy().into_owned()
        }

        /// Status of the entry itself, not following symlinks.
        pub(in crate::handle) fn info(&self) -> io::Result<FileInfo> {
            let stat = rustix::fs::statat(
                self.dir.fd()?,
                self.entry.file_name(),
                AtFlags::SYMLINK_NOFOLLOW,
            )?;
            Ok(FileInfo::from_stat(self.name(), &stat))
        }

        /// Kind from the directory record, falling back to lstat on
        /// filesystems that do not report it.
        pub(in crate::handle) fn kind(&self) -> io::Result<FileKind> {
            match self.entry.file_type() {
                FileType::Unknown => Ok(self.info()?.kind),
                file_type => Ok(file_type.into()),
            }
        }
    }
}

#[cfg(not(unix))]
mod unsupported {
    use std::convert::Infallible;
    use std::marker::PhantomData;

    use super::*;

    #[derive(Debug)]
    pub(in crate::handle) struct DirCursor {
        never: Infallible,
    }

    pub(in crate::handle) struct ListedEntry<'a> {
        never: Infallible,
        _dir: PhantomData<&'a ()>,
    }

    impl DirCursor {
        pub(in crate::handle) fn open(_file: &File) -> io::Result<Self> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "directory listing is not supported on this platform",
            ))
        }

        pub(in crate::handle) fn next_chunk<T>(
            &mut self,
            _limit: usize,
            _map: impl Fn(&ListedEntry<'_>) -> io::Result<T>,
        ) -> io::Result<Vec<T>> {
            match self.never {}
        }
    }

    impl ListedEntry<'_> {
        pub(in crate::handle) fn name(&self) -> String {
            match self.never {}
        }

        pub(in crate::handle) fn info(&self) -> io::Result<FileInfo> {
            match self.never {}
        }

        pub(in crate::handle) fn kind(&self) -> io::Result<FileKind> {
            match self.never {}
        }
    }
}
