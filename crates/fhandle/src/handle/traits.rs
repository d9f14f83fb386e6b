use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::SystemTime;

use crate::HandleResult;

use super::file_info::{DirEntry, FileInfo, FileMode};

/// Numeric OS descriptor of an open handle (a file descriptor on unix, a
/// `HANDLE` on windows).
pub type RawDescriptor = usize;

/* 📖 # Why is Handle a trait instead of a struct?

Code that needs a file should not care whether it talks to the OS or to a test
double. Depending on the trait lets tests substitute MockHandle, inject a
failing write, and still run the rest of the code against a real file.

Every method mirrors one operation of a platform file handle and reports
exactly the errors that operation reports. Methods take `&self` because a
platform handle is usable from several places at once; implementations bring
their own synchronisation.
*/

/// The complete set of operations an open file handle supports.
///
/// Implemented by [`OsHandle`](super::OsHandle) for real files and by
/// [`MockHandle`](super::MockHandle) for tests.
pub trait Handle: fmt::Debug + Send + Sync {
    /// List directory entries with their status information.
    ///
    /// With `n > 0` at most `n` entries are returned and an exhausted directory
    /// is an error. With `n <= 0` all remaining entries are returned.
    fn read_dir_info(&self, n: isize) -> HandleResult<Vec<FileInfo>>;

    /// Like [`read_dir_info`](Handle::read_dir_info), returning names only.
    fn read_dir_names(&self, n: isize) -> HandleResult<Vec<String>>;

    /// Like [`read_dir_info`](Handle::read_dir_info), returning lightweight entries.
    fn read_dir_entries(&self, n: isize) -> HandleResult<Vec<DirEntry>>;

    fn close(&self) -> HandleResult<()>;

    /// Change owner and group. `None` leaves the id unchanged.
    fn chown(&self, uid: Option<u32>, gid: Option<u32>) -> HandleResult<()>;

    fn truncate(&self, size: u64) -> HandleResult<()>;

    /// Flush file contents and metadata to the backing store.
    fn sync(&self) -> HandleResult<()>;

    /// Make the directory this handle refers to the process working directory.
    fn chdir(&self) -> HandleResult<()>;

    fn stat(&self) -> HandleResult<FileInfo>;

    /// The name the handle was opened with.
    fn name(&self) -> String;

    /// Read at the cursor, advancing it.
    fn read(&self, buf: &mut [u8]) -> HandleResult<usize>;

    /// Read at `offset` without moving the cursor.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> HandleResult<usize>;

    /// Copy everything from `reader` into the handle.
    fn read_from(&self, reader: &mut dyn Read) -> HandleResult<u64>;

    /// Write at the cursor, advancing it.
    fn write(&self, buf: &[u8]) -> HandleResult<usize>;

    /// Write at `offset` without moving the cursor.
    fn write_at(&self, buf: &[u8], offset: u64) -> HandleResult<usize>;

    fn write_str(&self, s: &str) -> HandleResult<usize>;

    /// Move the cursor, returning the new position from the start.
    fn seek(&self, pos: SeekFrom) -> HandleResult<u64>;

    fn chmod(&self, mode: FileMode) -> HandleResult<()>;

    /// Set read and write deadlines together. `None` clears them.
    fn set_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()>;

    fn set_read_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()>;

    fn set_write_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()>;

    /// Raw access to the descriptor for operations this trait does not cover.
    fn raw_conn(&self) -> HandleResult<Box<dyn RawConn>>;

    fn fd(&self) -> RawDescriptor;
}

/// Raw access to the descriptor behind a handle.
pub trait RawConn: fmt::Debug + Send + Sync {
    /// Run `f` with the descriptor, which stays valid for the duration of the call.
    fn control(&self, f: &mut dyn FnMut(RawDescriptor)) -> HandleResult<()>;

    /// Run `f` until it returns `true`, waiting for readability in between.
    fn read(&self, f: &mut dyn FnMut(RawDescriptor) -> bool) -> HandleResult<()>;

    /// Run `f` until it returns `true`, waiting for writability in between.
    fn write(&self, f: &mut dyn FnMut(RawDescriptor) -> bool) -> HandleResult<()>;
}

/* 📖 # Why wrap Arc<dyn Handle> in SharedHandle?

The same pattern as a shared service handle: cheap clones, no lifetime
parameters, and Deref to the trait object. On top of that SharedHandle speaks
std::io, so existing Read/Write/Seek based code works against any Handle.
*/

/// Shared, cloneable reference to a [`Handle`] implementation.
///
/// # Examples
///
/// ```
/// use fhandle::{MockHandle, SharedHandle};
///
/// let mut mock = MockHandle::new();
/// mock.name_fn = Some(Box::new(|| "memory".to_string()));
/// let handle = SharedHandle::new(mock);
/// let other = handle.clone();
/// assert_eq!(other.name(), "memory");
/// ```
#[derive(Debug, Clone)]
pub struct SharedHandle(Arc<dyn Handle>);

impl SharedHandle {
    pub fn new(handle: impl Handle + 'static) -> Self {
        Self(Arc::new(handle))
    }

    pub fn from_arc(handle: Arc<dyn Handle>) -> Self {
        Self(handle)
    }
}

impl std::ops::Deref for SharedHandle {
    type Target = dyn Handle;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl Read for SharedHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Handle::read(&*self.0, buf)?)
    }
}

impl Write for SharedHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Handle::write(&*self.0, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Writes are unbuffered; durability is `sync`.
        Ok(())
    }
}

impl Seek for SharedHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(Handle::seek(&*self.0, pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::mock::MockHandle;
    use std::sync::Mutex;

    #[test]
    fn test_shared_handle_clone_shares_implementation() {
        let mut mock = MockHandle::new();
        mock.fd_fn = Some(Box::new(|| 7));
        let handle = SharedHandle::new(mock);
        let clone = handle.clone();
        assert_eq!(handle.fd(), 7);
        assert_eq!(clone.fd(), 7);
    }

    #[test]
    fn test_shared_handle_io_write_goes_through_trait() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&written);
        let mut mock = MockHandle::new();
        mock.write_fn = Some(Box::new(move |buf: &[u8]| {
            sink.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }));

        let mut handle = SharedHandle::new(mock);
        write!(handle, "hello {}", 42).unwrap();
        assert_eq!(written.lock().unwrap().as_slice(), b"hello 42");
    }

    #[test]
    fn test_shared_handle_io_error_from_unset_slot() {
        let mut handle = SharedHandle::new(MockHandle::new());
        let mut buf = [0u8; 4];
        let err = Read::read(&mut handle, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(err.to_string(), "not implemented by mock");
    }
}
