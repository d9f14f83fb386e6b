use std::fmt;
use std::io::{Read, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::trace;

use crate::{Error, HandleResult};

use super::file_info::{DirEntry, FileInfo, FileMode};
use super::traits::{Handle, RawConn, RawDescriptor};

pub type ReadDirInfoFn = Box<dyn Fn(isize) -> HandleResult<Vec<FileInfo>> + Send + Sync>;
pub type ReadDirNamesFn = Box<dyn Fn(isize) -> HandleResult<Vec<String>> + Send + Sync>;
pub type ReadDirEntriesFn = Box<dyn Fn(isize) -> HandleResult<Vec<DirEntry>> + Send + Sync>;
pub type UnitFn = Box<dyn Fn() -> HandleResult<()> + Send + Sync>;
pub type ChownFn = Box<dyn Fn(Option<u32>, Option<u32>) -> HandleResult<()> + Send + Sync>;
pub type TruncateFn = Box<dyn Fn(u64) -> HandleResult<()> + Send + Sync>;
pub type StatFn = Box<dyn Fn() -> HandleResult<FileInfo> + Send + Sync>;
pub type NameFn = Box<dyn Fn() -> String + Send + Sync>;
pub type ReadFn = Box<dyn Fn(&mut [u8]) -> HandleResult<usize> + Send + Sync>;
pub type ReadAtFn = Box<dyn Fn(&mut [u8], u64) -> HandleResult<usize> + Send + Sync>;
pub type ReadFromFn = Box<dyn Fn(&mut dyn Read) -> HandleResult<u64> + Send + Sync>;
pub type WriteFn = Box<dyn Fn(&[u8]) -> HandleResult<usize> + Send + Sync>;
pub type WriteAtFn = Box<dyn Fn(&[u8], u64) -> HandleResult<usize> + Send + Sync>;
pub type WriteStrFn = Box<dyn Fn(&str) -> HandleResult<usize> + Send + Sync>;
pub type SeekFn = Box<dyn Fn(SeekFrom) -> HandleResult<u64> + Send + Sync>;
pub type ChmodFn = Box<dyn Fn(FileMode) -> HandleResult<()> + Send + Sync>;
pub type DeadlineFn = Box<dyn Fn(Option<SystemTime>) -> HandleResult<()> + Send + Sync>;
pub type RawConnFn = Box<dyn Fn() -> HandleResult<Box<dyn RawConn>> + Send + Sync>;
pub type FdFn = Box<dyn Fn() -> RawDescriptor + Send + Sync>;

/* 📖 # Why a struct of optional closures instead of a mocking framework?

Each slot is an ordinary closure with the exact signature of the operation it
stands in for. Tests set only the slots they exercise, and anything else fails
loudly with the mock sentinel instead of returning made-up data.

The mock keeps no state of its own. Call counting, recorded arguments or
scripted sequences belong inside the closures, where the test can see them.
*/

/// Configurable [`Handle`] for tests.
///
/// Every operation forwards to its slot. An unset slot makes the operation
/// fail with [`Error::mock_not_implemented`]; `name` and `fd`, which cannot
/// fail, return `""` and `0` instead.
///
/// Closure arguments that are references need a type annotation so the
/// closure accepts any lifetime.
///
/// # Examples
///
/// ```
/// use fhandle::{Error, Handle, MockHandle};
///
/// let mut mock = MockHandle::new();
/// mock.write_fn = Some(Box::new(|_buf: &[u8]| Err(Box::new(Error::message("disk full")))));
///
/// assert_eq!(mock.write(b"data").unwrap_err().to_string(), "disk full");
/// assert!(mock.sync().unwrap_err().is_mock_not_implemented());
/// assert_eq!(mock.name(), "");
/// ```
#[derive(Default)]
pub struct MockHandle {
    pub read_dir_info_fn: Option<ReadDirInfoFn>,
    pub read_dir_names_fn: Option<ReadDirNamesFn>,
    pub read_dir_entries_fn: Option<ReadDirEntriesFn>,
    pub close_fn: Option<UnitFn>,
    pub chown_fn: Option<ChownFn>,
    pub truncate_fn: Option<TruncateFn>,
    pub sync_fn: Option<UnitFn>,
    pub chdir_fn: Option<UnitFn>,
    pub stat_fn: Option<StatFn>,
    pub name_fn: Option<NameFn>,
    pub read_fn: Option<ReadFn>,
    pub read_at_fn: Option<ReadAtFn>,
    pub read_from_fn: Option<ReadFromFn>,
    pub write_fn: Option<WriteFn>,
    pub write_at_fn: Option<WriteAtFn>,
    pub write_str_fn: Option<WriteStrFn>,
    pub seek_fn: Option<SeekFn>,
    pub chmod_fn: Option<ChmodFn>,
    pub set_deadline_fn: Option<DeadlineFn>,
    pub set_read_deadline_fn: Option<DeadlineFn>,
    pub set_write_deadline_fn: Option<DeadlineFn>,
    pub raw_conn_fn: Option<RawConnFn>,
    pub fd_fn: Option<FdFn>,
}

impl MockHandle {
    /// A mock with every slot unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose slots all forward to `handle`.
    ///
    /// Reassign individual slots afterwards to change just those operations,
    /// e.g. make `write` fail while everything else hits the real file.
    pub fn delegating_to<H: Handle + ?Sized + 'static>(handle: Arc<H>) -> Self {
        Self {
            read_dir_info_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |n| h.read_dir_info(n)
            })),
            read_dir_names_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |n| h.read_dir_names(n)
            })),
            read_dir_entries_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |n| h.read_dir_entries(n)
            })),
            close_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.close()
            })),
            chown_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |uid, gid| h.chown(uid, gid)
            })),
            truncate_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |size| h.truncate(size)
            })),
            sync_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.sync()
            })),
            chdir_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.chdir()
            })),
            stat_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.stat()
            })),
            name_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.name()
            })),
            read_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |buf: &mut [u8]| Handle::read(&*h, buf)
            })),
            read_at_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |buf: &mut [u8], offset| h.read_at(buf, offset)
            })),
            read_from_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |reader: &mut dyn Read| h.read_from(reader)
            })),
            write_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |buf: &[u8]| h.write(buf)
            })),
            write_at_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |buf: &[u8], offset| h.write_at(buf, offset)
            })),
            write_str_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |s: &str| h.write_str(s)
            })),
            seek_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |pos| h.seek(pos)
            })),
            chmod_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |mode| h.chmod(mode)
            })),
            set_deadline_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |deadline| h.set_deadline(deadline)
            })),
            set_read_deadline_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |deadline| h.set_read_deadline(deadline)
            })),
            set_write_deadline_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move |deadline| h.set_write_deadline(deadline)
            })),
            raw_conn_fn: Some(Box::new({
                let h = Arc::clone(&handle);
                move || h.raw_conn()
            })),
            fd_fn: Some(Box::new(move || handle.fd())),
        }
    }

    fn slot_names(&self) -> Vec<&'static str> {
        let slots = [
            ("read_dir_info", self.read_dir_info_fn.is_some()),
            ("read_dir_names", self.read_dir_names_fn.is_some()),
            ("read_dir_entries", self.read_dir_entries_fn.is_some()),
            ("close", self.close_fn.is_some()),
            ("chown", self.chown_fn.is_some()),
            ("truncate", self.truncate_fn.is_some()),
            ("sync", self.sync_fn.is_some()),
            ("chdir", self.chdir_fn.is_some()),
            ("stat", self.stat_fn.is_some()),
            ("name", self.name_fn.is_some()),
            ("read", self.read_fn.is_some()),
            ("read_at", self.read_at_fn.is_some()),
            ("read_from", self.read_from_fn.is_some()),
            ("write", self.write_fn.is_some()),
            ("write_at", self.write_at_fn.is_some()),
            ("write_str", self.write_str_fn.is_some()),
            ("seek", self.seek_fn.is_some()),
            ("chmod", self.chmod_fn.is_some()),
            ("set_deadline", self.set_deadline_fn.is_some()),
            ("set_read_deadline", self.set_read_deadline_fn.is_some()),
            ("set_write_deadline", self.set_write_deadline_fn.is_some()),
            ("raw_conn", self.raw_conn_fn.is_some()),
            ("fd", self.fd_fn.is_some()),
        ];
        slots
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name)
            .collect()
    }
}

fn not_implemented<T>(operation: &'static str) -> HandleResult<T> {
    trace!(operation, "mock slot not set");
    Err(Box::new(Error::mock_not_implemented()))
}

/// Lists the slots that are set.
impl fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHandle")
            .field("slots", &self.slot_names())
            .finish()
    }
}

impl Handle for MockHandle {
    fn read_dir_info(&self, n: isize) -> HandleResult<Vec<FileInfo>> {
        match &self.read_dir_info_fn {
            Some(f) => f(n),
            None => not_implemented("read_dir_info"),
        }
    }

    fn read_dir_names(&self, n: isize) -> HandleResult<Vec<String>> {
        match &self.read_dir_names_fn {
            Some(f) => f(n),
            None => not_implemented("read_dir_names"),
        }
    }

    fn read_dir_entries(&self, n: isize) -> HandleResult<Vec<DirEntry>> {
        match &self.read_dir_entries_fn {
            Some(f) => f(n),
            None => not_implemented("read_dir_entries"),
        }
    }

    fn close(&self) -> HandleResult<()> {
        match &self.close_fn {
            Some(f) => f(),
            None => not_implemented("close"),
        }
    }

    fn chown(&self, uid: Option<u32>, gid: Option<u32>) -> HandleResult<()> {
        match &self.chown_fn {
            Some(f) => f(uid, gid),
            None => not_implemented("chown"),
        }
    }

    fn truncate(&self, size: u64) -> HandleResult<()> {
        match &self.truncate_fn {
            Some(f) => f(size),
            None => not_implemented("truncate"),
        }
    }

    fn sync(&self) -> HandleResult<()> {
        match &self.sync_fn {
            Some(f) => f(),
            None => not_implemented("sync"),
        }
    }

    fn chdir(&self) -> HandleResult<()> {
        match &self.chdir_fn {
            Some(f) => f(),
            None => not_implemented("chdir"),
        }
    }

    fn stat(&self) -> HandleResult<FileInfo> {
        match &self.stat_fn {
            Some(f) => f(),
            None => not_implemented("stat"),
        }
    }

    fn name(&self) -> String {
        match &self.name_fn {
            Some(f) => f(),
            None => String::new(),
        }
    }

    fn read(&self, buf: &mut [u8]) -> HandleResult<usize> {
        match &self.read_fn {
            Some(f) => f(buf),
            None => not_implemented("read"),
        }
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> HandleResult<usize> {
        match &self.read_at_fn {
            Some(f) => f(buf, offset),
            None => not_implemented("read_at"),
        }
    }

    fn read_from(&self, reader: &mut dyn Read) -> HandleResult<u64> {
        match &self.read_from_fn {
            Some(f) => f(reader),
            None => not_implemented("read_from"),
        }
    }

    fn write(&self, buf: &[u8]) -> HandleResult<usize> {
        match &self.write_fn {
            Some(f) => f(buf),
            None => not_implemented("write"),
        }
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> HandleResult<usize> {
        match &self.write_at_fn {
            Some(f) => f(buf, offset),
            None => not_implemented("write_at"),
        }
    }

    fn write_str(&self, s: &str) -> HandleResult<usize> {
        match &self.write_str_fn {
            Some(f) => f(s),
            None => not_implemented("write_str"),
        }
    }

    fn seek(&self, pos: SeekFrom) -> HandleResult<u64> {
        match &self.seek_fn {
            Some(f) => f(pos),
            None => not_implemented("seek"),
        }
    }

    fn chmod(&self, mode: FileMode) -> HandleResult<()> {
        match &self.chmod_fn {
            Some(f) => f(mode),
            None => not_implemented("chmod"),
        }
    }

    fn set_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()> {
        match &self.set_deadline_fn {
            Some(f) => f(deadline),
            None => not_implemented("set_deadline"),
        }
    }

    fn set_read_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()> {
        match &self.set_read_deadline_fn {
            Some(f) => f(deadline),
            None => not_implemented("set_read_deadline"),
        }
    }

    fn set_write_deadline(&self, deadline: Option<SystemTime>) -> HandleResult<()> {
        match &self.set_write_deadline_fn {
            Some(f) => f(deadline),
            None => not_implemented("set_write_deadline"),
        }
    }

    fn raw_conn(&self) -> HandleResult<Box<dyn RawConn>> {
        match &self.raw_conn_fn {
            Some(f) => f(),
            None => not_implemented("raw_conn"),
        }
    }

    fn fd(&self) -> RawDescriptor {
        match &self.fd_fn {
            Some(f) => f(),
            None => 0,
        }
    }
}
