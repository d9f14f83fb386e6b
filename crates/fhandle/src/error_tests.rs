/* 📖 # Why use a separate file for these error tests?

The span trace tests depend on where spans are entered.

Keeping them out of the main error module means edits there do not shift what the tests observe.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{Error, HandleResult, ResultExt};
    use expect_test::expect;
    use std::error::Error as _;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Set up tracing with ErrorLayer for tests.
    /// Uses `try_init()` to handle multiple tests running concurrently.
    fn setup_tracing_subscriber() {
        let _ = tracing_subscriber::registry()
            .with(ErrorLayer::default())
            .try_init();
    }

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let path = PathBuf::from("test.txt");
        let error = Error::new(ErrorKind::FileError {
            path: path.clone(),
            source: io_err,
        });

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => {
                assert_eq!(p, &path);
            }
            _ => panic!("Expected FileError variant"),
        }
    }

    #[test]
    fn test_mock_sentinel_is_recognised() {
        let error = Error::mock_not_implemented();
        assert!(error.is_mock_not_implemented());
        assert_eq!(error.to_string(), "not implemented by mock");

        let other = Error::message("not implemented by mock");
        assert!(!other.is_mock_not_implemented());
    }

    #[test]
    fn test_closed_and_end_of_directory_predicates() {
        let closed = Error::new(ErrorKind::Closed {
            path: PathBuf::from("a.txt"),
        });
        assert!(closed.is_closed());
        assert!(!closed.is_end_of_directory());
        assert_eq!(closed.to_string(), "File already closed: a.txt");

        let eod = Error::new(ErrorKind::EndOfDirectory {
            path: PathBuf::from("dir"),
        });
        assert!(eod.is_end_of_directory());
        assert!(!eod.is_closed());
    }

    #[test]
    fn test_error_context_attachment() {
        let error = Error::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.get_context().len(), 2);
        assert_eq!(error.get_context()[0], "first context");
        assert_eq!(error.get_context()[1], "second context");
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = Error::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.get_context()[0], "lazy context");
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = Error::message("root error")
            .context("first")
            .context("second")
            .context("third");
        assert_eq!(error.to_string(), "first: second: third: root error");
    }

    #[test]
    fn test_error_display_file_error() {
        let error = Error::new(ErrorKind::FileError {
            path: PathBuf::from("/tmp/test.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });
        let display = error.to_string();
        assert!(display.contains("/tmp/test.txt"));
        assert!(display.contains("not found"));
    }

    #[test]
    fn test_error_display_deadline_variants() {
        assert_eq!(
            Error::new(ErrorKind::NoDeadline).to_string(),
            "file type does not support deadline"
        );
        assert_eq!(
            Error::new(ErrorKind::NotPollable).to_string(),
            "waiting for unsupported file type"
        );
    }

    #[test]
    fn test_error_source_and_root_cause() {
        let error = Error::new(ErrorKind::FileError {
            path: PathBuf::from("test.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        });
        assert!(error.source().is_some());
        assert_eq!(error.root_cause().to_string(), "access denied");

        let message = Error::message("test");
        assert!(message.source().is_none());
        assert_eq!(message.root_cause().to_string(), "test");
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: HandleResult<i32> = Err(Box::new(Error::message("root")));
        let err = result
            .context("step 1")
            .with_context(|| "step 2".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: root");
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: HandleResult<i32> = Ok(42);
        assert_eq!(result.context("operation failed").unwrap(), 42);
    }

    #[test]
    fn test_into_io_error_keeps_kind() {
        let err = Box::new(Error::new(ErrorKind::FileError {
            path: PathBuf::from("x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);

        let io_err: io::Error = Box::new(Error::mock_not_implemented()).into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(io_err.to_string(), "not implemented by mock");
    }

    #[test]
    fn test_debug_pretty_print_without_spans() {
        let error = Error::message("something went wrong")
            .context("during file processing")
            .context("in batch job");

        expect![[r#"
            something went wrong
            ├─ during file processing
            └─ in batch job

        "#]]
        .assert_debug_eq(&error);
    }

    #[test]
    fn test_span_trace_records_operation_span() {
        setup_tracing_subscriber();

        let operation_span = span!(tracing::Level::DEBUG, "handle_operation", fd = 3);
        let _guard = operation_span.enter();

        let error = Error::message("write failed");
        let trace = error.span_trace().to_string();
        assert!(trace.contains("handle_operation"));
        assert!(format!("{:?}", error).contains("Trace:"));
    }
}
