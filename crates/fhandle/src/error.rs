use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- The mock sentinel must be recognisable by kind, which a type-erased error hides
 */

/// Error variants that can occur in handle operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// The underlying platform primitive failed
    FileError { path: PathBuf, source: io::Error },

    /// The handle was already closed
    Closed { path: PathBuf },

    /// A bounded directory listing found no entries left
    EndOfDirectory { path: PathBuf },

    /// The handle does not support I/O deadlines
    NoDeadline,

    /// The handle cannot wait for readiness
    NotPollable,

    /// A mock slot was invoked without being set
    MockNotImplemented,

    /// Catch-all for other errors with a message
    Message { message: String },
}

/* 📖 # Why separate ErrorKind and Error?
This two-layer design keeps the structural variant apart from runtime context:
- ErrorKind: variants with specific contexts (file paths, io errors)
- Error: wraps ErrorKind with context strings and the span trace at creation

Callers pattern match on ErrorKind, e.g. to tell the mock sentinel apart from a
delegated failure, while propagation code only ever sees Error.
*/

/// Error wrapping an [`ErrorKind`] with optional context and a span trace.
pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl Error {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a `Message` error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates the error returned by a mock for an unset slot.
    pub fn mock_not_implemented() -> Self {
        Self::new(ErrorKind::MockNotImplemented)
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the attached context, outermost last.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// True if this is the error a mock returns for an unset slot.
    pub fn is_mock_not_implemented(&self) -> bool {
        matches!(self.kind, ErrorKind::MockNotImplemented)
    }

    /// True if the handle was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, ErrorKind::Closed { .. })
    }

    /// True if a bounded directory listing ran out of entries.
    pub fn is_end_of_directory(&self) -> bool {
        matches!(self.kind, ErrorKind::EndOfDirectory { .. })
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_kind(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Closed { path } => {
                write!(f, "File already closed: {}", path.display())
            }
            ErrorKind::EndOfDirectory { path } => {
                write!(f, "No more directory entries: {}", path.display())
            }
            ErrorKind::NoDeadline => write!(f, "file type does not support deadline"),
            ErrorKind::NotPollable => write!(f, "waiting for unsupported file type"),
            ErrorKind::MockNotImplemented => write!(f, "not implemented by mock"),
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        self.fmt_kind(f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_kind(f)?;
        writeln!(f)?;
        let count = self.context.len();
        for (i, ctx) in self.context.iter().enumerate() {
            let branch = if i + 1 == count { "└─" } else { "├─" };
            writeln!(f, "{} {}", branch, ctx)?;
        }
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Converts into an `io::Error`, keeping the kind of a wrapped io failure.
impl From<Box<Error>> for io::Error {
    fn from(err: Box<Error>) -> Self {
        let kind = match err.kind() {
            ErrorKind::FileError { source, .. } => source.kind(),
            ErrorKind::EndOfDirectory { .. } => io::ErrorKind::UnexpectedEof,
            ErrorKind::NoDeadline | ErrorKind::NotPollable | ErrorKind::MockNotImplemented => {
                io::ErrorKind::Unsupported
            }
            ErrorKind::Closed { .. } | ErrorKind::Message { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/* 📖 # Why use Box<Error> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.
Handle operations like `read` and `write` are called in tight loops, so the Ok path matters.
*/

/// Standard result type for handle operations.
pub type HandleResult<T> = std::result::Result<T, Box<Error>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> HandleResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> HandleResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for HandleResult<T> {
    fn context(self, context: impl Into<String>) -> HandleResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> HandleResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}
