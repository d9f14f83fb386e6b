/* 📖 # What is the handle layer?

A trait-based abstraction over an open file, so code can be tested without
touching the filesystem, or with a real file whose individual operations are
made to fail.

- Handle: every operation an open file supports
- OsHandle: passes each operation through to std::fs::File
- MockHandle: one optional closure per operation, for tests
*/

mod dir_cursor;
mod file_info;
pub mod mock;
pub mod os_handle;
mod traits;

pub use file_info::{DirEntry, FileInfo, FileKind, FileMode};
pub use mock::MockHandle;
pub use os_handle::OsHandle;
pub use traits::{Handle, RawConn, RawDescriptor, SharedHandle};
