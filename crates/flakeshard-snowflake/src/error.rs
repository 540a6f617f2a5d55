use jiff::Timestamp;
use thiserror::Error;

/// Type alias for generator results.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by node configuration, generator initialization and ID generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid worker id {worker_id}; expected 0..={max}")]
    InvalidWorkerId { worker_id: i64, max: u8 },
    #[error("invalid datacenter id {datacenter_id}; expected 0..={max}")]
    InvalidDatacenterId { datacenter_id: i64, max: u8 },
    #[error("malformed value {value:?} for {field}: expected an integer")]
    MalformedConfig { field: &'static str, value: String },
    #[error("epoch is ahead of current clock time: epoch={epoch}, now={now}")]
    EpochAhead { epoch: Timestamp, now: Timestamp },
    #[error("clock moved backwards by {}ms: last={last}, now={now}", .last.as_millisecond() - .now.as_millisecond())]
    ClockRollback { last: Timestamp, now: Timestamp },
    #[error("overtime limit")]
    OverTimeLimit,
    #[error("generator state lock is poisoned")]
    StatePoisoned,
}

impl Error {
    /// Returns `true` for errors that stem from a misconfigured node identity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidWorkerId { .. }
                | Error::InvalidDatacenterId { .. }
                | Error::MalformedConfig { .. }
        )
    }
}
