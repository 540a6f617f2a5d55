//! Time-ordered 64-bit id generation.
//!
//! Ids are laid out as `0 | timestamp (41) | datacenter (5) | worker (5) | sequence (12)`,
//! with the timestamp counted in milliseconds from a custom epoch so it can be
//! recovered later with [`try_extract_timestamp`].

pub mod clock;
pub mod config;
pub mod error;
mod generator;
pub mod id;

pub use clock::{Clock, SystemClock};
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use generator::{Snowflake, SnowflakeSettings};
pub use id::{try_extract_timestamp, SnowflakeId, DEFAULT_EPOCH};
