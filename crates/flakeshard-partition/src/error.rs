use thiserror::Error;

/// Type alias for partition results.
pub type Result<T> = std::result::Result<T, PartitionError>;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("unknown time zone {name:?}: {source}")]
    UnknownTimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
    #[error("shard key prefix must not be empty")]
    EmptyKeyPrefix,
}
