use jiff::{SignedDuration, Timestamp};
use modular_bitfield::prelude::*;
use std::cmp::Ordering;
use std::fmt;

pub const SEQUENCE_BITS: u32 = 12;
pub const WORKER_ID_BITS: u32 = 5;
pub const DATACENTER_ID_BITS: u32 = 5;
pub const TIMESTAMP_BITS: u32 = 41;

pub const WORKER_ID_SHIFT: u32 = SEQUENCE_BITS;
pub const DATACENTER_ID_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS;
pub const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS + DATACENTER_ID_BITS;

pub const MAX_WORKER_ID: u8 = (1 << WORKER_ID_BITS) - 1;
pub const MAX_DATACENTER_ID: u8 = (1 << DATACENTER_ID_BITS) - 1;
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;
pub const MAX_TIMESTAMP_MILLIS: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Milliseconds since the Unix epoch of 2024-01-01T00:00:00Z.
pub const DEFAULT_EPOCH_MILLIS: i64 = 1_704_067_200_000;

/// The default custom epoch, 2024-01-01T00:00:00Z.
pub const DEFAULT_EPOCH: Timestamp = Timestamp::constant(DEFAULT_EPOCH_MILLIS / 1_000, 0);

/// A 64-bit snowflake identifier.
///
/// Fields are declared from the least significant bit upwards. The top bit is
/// never written so the value stays positive when stored as a signed integer.
#[bitfield]
#[repr(u64)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnowflakeId {
    /// 12 bits for sequence number (resets every millisecond).
    pub sequence: B12,
    /// 5 bits for worker ID.
    pub worker_id: B5,
    /// 5 bits for datacenter ID.
    pub datacenter_id: B5,
    /// 41 bits for timestamp (milliseconds since a custom epoch).
    pub timestamp: B41,
    #[skip]
    __: B1,
}

impl SnowflakeId {
    /// Returns the raw 64-bit value.
    pub fn to_raw(self) -> u64 {
        u64::from(self)
    }

    /// Returns the wall-clock time embedded in this id, given the epoch it was
    /// generated against.
    pub fn timestamp_at(self, epoch: Timestamp) -> Option<Timestamp> {
        try_extract_timestamp(self.to_raw(), epoch)
    }
}

// The bitfield stores little-endian bytes, so ordering goes through the raw value.
impl Ord for SnowflakeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_raw().cmp(&other.to_raw())
    }
}

impl PartialOrd for SnowflakeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

/// Recovers the timestamp embedded in `raw`.
///
/// Returns `None` when `raw` is not positive as a signed 64-bit value or when
/// its timestamp field is zero, which is the case for identifiers that were not
/// produced by a snowflake generator (small sequential ids, for example).
pub fn try_extract_timestamp(raw: u64, epoch: Timestamp) -> Option<Timestamp> {
    if raw == 0 || raw > i64::MAX as u64 {
        return None;
    }
    let elapsed = raw >> TIMESTAMP_SHIFT;
    if elapsed == 0 {
        return None;
    }
    epoch
        .checked_add(SignedDuration::from_millis(elapsed as i64))
        .ok()
}
