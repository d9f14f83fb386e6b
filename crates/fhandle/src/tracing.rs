use crate::error::HandleResult;
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber: fmt output filtered by `RUST_LOG`, plus the
/// layer that lets errors capture span traces.
pub fn init_tracing() -> HandleResult<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| {
            Box::new(crate::Error::message(format!(
                "Failed to install tracing subscriber: {}",
                e
            )))
        })
}
