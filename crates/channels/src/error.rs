/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed channel errors shared across channel traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fan-in queue was closed; the router is no longer consuming.
    #[error("event feed closed for source {source_name}")]
    FeedClosed { source_name: String },
}

impl Error {
    #[must_use]
    pub fn feed_closed(source_name: impl std::fmt::Display) -> Self {
        Self::FeedClosed {
            source_name: source_name.to_string(),
        }
    }
}
