use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, trace};

use crate::config::OpenConfig;
use crate::error::ErrorKind;
use crate::{Error, HandleResult};

use super::dir_cursor::{DirCursor, ListedEntry};
use super::file_info::{DirEntry, FileInfo, FileMode};
use super::traits::{Handle, RawConn, RawDescriptor};

/* 📖 # Why does OsHandle keep the File behind a lock?

A platform handle can be used from several threads and closed by any of them.
I/O takes a read lock, so reads and writes from different threads run side by
side, while close takes the write lock and waits for them. After close the slot
is None and every operation reports Closed instead of touching a stale
descriptor.

The directory cursor lives in its own mutex: listing a directory in chunks
continues where the previous call stopped, and seeking restarts it. Listing
and chdir go through the descriptor, never through the path, so they follow
the directory even if it is renamed while open.
*/

#[derive(Debug)]
struct Inner {
    /// Path as given by the caller; returned by `name`.
    path: PathBuf,
    file: RwLock<Option<File>>,
}

impl Inner {
    fn file_error(&self, source: io::Error) -> Box<Error> {
        Box::new(Error::new(ErrorKind::FileError {
            path: self.path.clone(),
            source,
        }))
    }

    fn closed_error(&self) -> Box<Error> {
        Box::new(Error::new(ErrorKind::Closed {
            path: self.path.clone(),
        }))
    }

    fn with_file<T>(&self, op: impl FnOnce(&File) -> io::Result<T>) -> HandleResult<T> {
        let guard = self.file.read();
        let file = guard.as_ref().ok_or_else(|| self.closed_error())?;
        op(file).map_err(|e| {
            debug!(path = %self.path.display(), error = %e, "file operation failed");
            self.file_error(e)
        })
    }
}

/// A [`Handle`] backed by an open [`std::fs::File`].
///
/// Every operation is passed through to the matching OS primitive.
#[derive(Debug)]
pub struct OsHandle {
    inner: Arc<Inner>,
    dir_cursor: Mutex<Option<DirCursor>>,
}

impl OsHandle {
    /// Open an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> HandleResult<Self> {
        Self::open_with(path, &OpenConfig::read_only())
    }

    /// Create a file for reading and writing, truncating it if it exists.
    pub fn create(path: impl AsRef<Path>) -> HandleResult<Self> {
        Self::open_with(path, &OpenConfig::read_write_create())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, config: &OpenConfig) -> HandleResult<Self> {
        let path = path.as_ref();
        debug!(?config, "opening file");
        let file = config.to_open_options().open(path).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Box::new(Error::new(ErrorKind::FileError {
                path: path.to_path_buf(),
                source: e,
            }))
        })?;
        debug!("file opened successfully");
        Ok(Self::from_file(path, file))
    }

    /// Wrap an already opened file. `path` is only what `name` reports and
    /// may be empty.
    pub fn from_file(path: impl Into<PathBuf>, file: File) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                file: RwLock::new(Some(file)),
            }),
            dir_cursor: Mutex::new(None),
        }
    }

    fn base_name(&self) -> String {
        match self.inner.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.inner.path.to_string_lossy().into_owned(),
        }
    }

    /// Shared implementation of the three directory listings.
    fn next_dir_entries<T>(
        &self,
        n: isize,
        map: impl Fn(&ListedEntry<'_>) -> io::Result<T>,
    ) -> HandleResult<Vec<T>> {
        let guard = self.inner.file.read();
        let file = guard.as_ref().ok_or_else(|| self.inner.closed_error())?;

        let mut cursor = self.dir_cursor.lock();
        let mut entries = match cursor.take() {
            Some(entries) => entries,
            None => {
                debug!(path = %self.inner.path.display(), "starting directory listing");
                DirCursor::open(file).map_err(|e| self.inner.file_error(e))?
            }
        };

        let limit = if n > 0 { n as usize } else { usize::MAX };
        let collected = entries.next_chunk(limit, map);
        *cursor = Some(entries);
        let collected = collected.map_err(|e| self.inner.file_error(e))?;

        trace!(count = collected.len(), n, "read directory entries");
        if n > 0 && collected.is_empty() {
            return Err(Box::new(Error::new(ErrorKind::EndOfDirectory {
                path: self.inner.path.clone(),
            })));
        }
        Ok(collected)
    }

    fn check_open(&self) -> HandleResult<()> {
        if self.inner.file.read().is_none() {
            return Err(self.inner.closed_error());
        }
        Ok(())
    }

    fn no_deadline(&self) -> HandleResult<()> {
        self.check_open()?;
        Err(Box::new(Error::new(ErrorKind::NoDeadline)))
    }
}

#[cfg(unix)]
fn raw_descriptor(file: &File) -> RawDescriptor {
    use std::os::unix::io::AsRawFd;
    file.as_raw_fd() as RawDescriptor
}

#[cfg(windows)]
fn raw_descriptor(file: &File) -> RawDescriptor {
    use std::os::windows::io::AsRawHandle;
    file.as_raw_handle() as RawDescriptor
}

#[cfg(not(any(unix, windows)))]
fn raw_descriptor(_file: &File) -> RawDescriptor {
    0
}

#[cfg(not(unix))]
fn unsupported(operation: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{} is not supported on this platform", operation),
    )
}

impl Handle for OsHandle {
    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn read_dir_info(&self, n: isize) -> HandleResult<Vec<FileInfo>> {
        self.next_dir_entries(n, |entry| entry.info())
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn read_dir_names(&self, n: isize) -> HandleResult<Vec<String>> {
        self.next_dir_entries(n, |entry| Ok(entry.name()))
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn read_dir_entries(&self, n: isize) -> HandleResult<Vec<DirEntry>> {
        self.next_dir_entries(n, |entry| {
            Ok(DirEntry {
                name: entry.name(),
                kind: entry.kind()?,
            })
        })
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn close(&self) -> HandleResult<()> {
        let file = self.inner.file.write().take();
        match file {
            Some(file) => {
                *self.dir_cursor.lock() = None;
                drop(file);
                debug!("file closed");
                Ok(())
            }
            None => {
                debug!("file already closed");
                Err(self.inner.closed_error())
            }
        }
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn chown(&self, uid: Option<u32>, gid: Option<u32>) -> HandleResult<()> {
        self.inner.with_file(|file| {
            #[cfg(unix)]
            {
                std::os::unix::fs::fchown(file, uid, gid)
            }
            #[cfg(not(unix))]
            {
                let _ = (file, uid, gid);
                Err(unsupported("chown"))
            }
        })
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn truncate(&self, size: u64) -> HandleResult<()> {
        self.inner.with_file(|file| file.set_len(size))
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn sync(&self) -> HandleResult<()> {
        self.inner.with_file(|file| file.sync_all())
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn chdir(&self) -> HandleResult<()> {
        self.inner.with_file(|file| {
            #[cfg(unix)]
            {
                rustix::process::fchdir(file).map_err(io::Error::from)
            }
            #[cfg(not(unix))]
            {
                let _ = file;
                Err(unsupported("chdir"))
            }
        })
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn stat(&self) -> HandleResult<FileInfo> {
        let metadata = self.inner.with_file(|file| file.metadata())?;
        Ok(FileInfo::from_metadata(self.base_name(), &metadata))
    }

    fn name(&self) -> String {
        self.inner.path.to_string_lossy().into_owned()
    }

    fn read(&self, buf: &mut [u8]) -> HandleResult<usize> {
        self.inner.with_file(|mut file| file.read(buf))
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> HandleResult<usize> {
        self.inner.with_file(|file| {
            #[cfg(unix)]
            {
                std::os::unix::fs::FileExt::read_at(file, buf, offset)
            }
            #[cfg(windows)]
            {
                std::os::windows::fs::FileExt::seek_read(file, buf, offset)
            }
            #[cfg(not(any(unix, windows)))]
            {
                let _ = (file, buf, offset);
                Err(unsupported("read_at"))
            }
        })
    }

    fn read_from(&self, reader: &mut dyn Read) -> HandleResult<u64> {
        self.inner.with_file(|mut file| io::copy(reader, &mut file))
    }

    fn write(&self, buf: &[u8]) -> HandleResult<usize> {
        self.inner.with_file(|mut file| file.write(buf))
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> HandleResult<usize> {
        self.inner.with_file(|file| {
            #[cfg(unix)]
            {
                std::os::unix::fs::FileExt::write_at(file, buf, offset)
            }
            #[cfg(windows)]
            {
                std::os::windows::fs::FileExt::seek_write(file, buf, offset)
            }
            #[cfg(not(any(unix, windows)))]
            {
                let _ = (file, buf, offset);
                Err(unsupported("write_at"))
            }
        })
    }

    fn write_str(&self, s: &str) -> HandleResult<usize> {
        self.write(s.as_bytes())
    }

    fn seek(&self, pos: SeekFrom) -> HandleResult<u64> {
        *self.dir_cursor.lock() = None;
        self.inner.with_file(|mut file| file.seek(pos))
    }

    #[instrument(skip(self), fields(path = %self.inner.path.display()))]
    fn chmod(&self, mode: FileMode) -> HandleResult<()> {
        self.inner.with_file(|file| {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(mode.bits()))
            }
            #[cfg(not(unix))]
            {
                let mut permissions = file.metadata()?.permissions();
                permissions.set_readonly(mode.is_readonly());
                file.set_permissions(permissions)
            }
        })
    }

    fn set_deadline(&self, _deadline: Option<SystemTime>) -> HandleResult<()> {
        self.no_deadline()
    }

    fn set_read_deadline(&self, _deadline: Option<SystemTime>) -> HandleResult<()> {
        self.no_deadline()
    }

    fn set_write_deadline(&self, _deadline: Option<SystemTime>) -> HandleResult<()> {
        self.no_deadline()
    }

    fn raw_conn(&self) -> HandleResult<Box<dyn RawConn>> {
        self.check_open()?;
        Ok(Box::new(OsRawConn {
            inner: Arc::clone(&self.inner),
        }))
    }

    fn fd(&self) -> RawDescriptor {
        match self.inner.file.read().as_ref() {
            Some(file) => raw_descriptor(file),
            None => RawDescriptor::MAX,
        }
    }
}

/// [`RawConn`] for an [`OsHandle`]. Holds the handle open for the duration of
/// each callback; fails with Closed once the handle is closed.
#[derive(Debug)]
struct OsRawConn {
    inner: Arc<Inner>,
}

impl OsRawConn {
    fn run<T>(&self, f: impl FnOnce(RawDescriptor) -> T) -> HandleResult<T> {
        let guard = self.inner.file.read();
        let file = guard.as_ref().ok_or_else(|| self.inner.closed_error())?;
        Ok(f(raw_descriptor(file)))
    }

    /// Regular files never become ready later, so a callback that is not done
    /// after its first call cannot be retried.
    fn run_until_done(&self, f: &mut dyn FnMut(RawDescriptor) -> bool) -> HandleResult<()> {
        if self.run(f)? {
            Ok(())
        } else {
            Err(Box::new(Error::new(ErrorKind::NotPollable)))
        }
    }
}

impl RawConn for OsRawConn {
    fn control(&self, f: &mut dyn FnMut(RawDescriptor)) -> HandleResult<()> {
        self.run(f)
    }

    fn read(&self, f: &mut dyn FnMut(RawDescriptor) -> bool) -> HandleResult<()> {
        self.run_until_done(f)
    }

    fn write(&self, f: &mut dyn FnMut(RawDescriptor) -> bool) -> HandleResult<()> {
        self.run_until_done(f)
    }
}
