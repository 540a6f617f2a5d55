//! Daily shard keys for time-partitioned collections.
//!
//! A logical collection keyed by `<prefix><type id>` is split into one shard per
//! calendar day. The day of an entity is read from its snowflake id when
//! possible, so callers do not have to store a creation time next to it.

mod deriver;
pub mod error;
mod shard_key;

pub use deriver::{
    time_zone_from_name, PartitionKeyDeriver, PartitionSettings, DEFAULT_WINDOW_DAYS,
    MAX_WINDOW_DAYS,
};
pub use error::{PartitionError, Result};
pub use shard_key::ShardKey;
