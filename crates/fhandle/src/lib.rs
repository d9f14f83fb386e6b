/* 📖 # Why put the file handle behind a trait?

Code written against `std::fs::File` can only be tested against real files,
and real files rarely fail on demand. Writing it against `Handle` instead lets
a test hand in a `MockHandle` that forwards to a real file but fails `write`
with a disk-full error, or a bare mock that only answers `stat`.
*/

pub mod config;
pub mod error;
mod error_tests;
pub mod handle;
pub mod tracing;

// Re-export commonly used types for convenience
pub use config::OpenConfig;
pub use error::{Error, HandleResult, ResultExt};
pub use handle::{
    DirEntry, FileInfo, FileKind, FileMode, Handle, MockHandle, OsHandle, RawConn, RawDescriptor,
    SharedHandle,
};
