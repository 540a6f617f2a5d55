use crate::error::{Error, Result};
use crate::id::{MAX_DATACENTER_ID, MAX_WORKER_ID};

pub const WORKER_ID_ENV: &str = "FLAKESHARD_WORKER_ID";
pub const DATACENTER_ID_ENV: &str = "FLAKESHARD_DATACENTER_ID";

pub const WORKER_ID_FIELD: &str = "worker-id";
pub const DATACENTER_ID_FIELD: &str = "datacenter-id";

/// The identity a node stamps into every id it generates.
///
/// Uniqueness across nodes relies on every node running with a distinct
/// `(datacenter_id, worker_id)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeConfig {
    pub datacenter_id: u8,
    pub worker_id: u8,
}

impl NodeConfig {
    /// Resolves the node identity from explicit properties, falling back to
    /// [`WORKER_ID_ENV`] / [`DATACENTER_ID_ENV`] and finally to `0`.
    pub fn resolve(worker_property: Option<&str>, datacenter_property: Option<&str>) -> Result<Self> {
        let worker_id = resolve_id(WORKER_ID_FIELD, worker_property, WORKER_ID_ENV, MAX_WORKER_ID)?;
        let datacenter_id = resolve_id(
            DATACENTER_ID_FIELD,
            datacenter_property,
            DATACENTER_ID_ENV,
            MAX_DATACENTER_ID,
        )?;

        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }
}

/// Resolves a single id in `[0, max]`.
///
/// The property wins over the environment variable `env_key`; blank values count
/// as unset and an unset id defaults to `0`.
pub fn resolve_id(field: &'static str, property: Option<&str>, env_key: &str, max: u8) -> Result<u8> {
    let env_value = std::env::var(env_key).ok();
    let raw = non_blank(property).or_else(|| non_blank(env_value.as_deref()));

    let Some(raw) = raw else {
        return Ok(0);
    };

    let value: i64 = raw.parse().map_err(|_| Error::MalformedConfig {
        field,
        value: raw.to_string(),
    })?;

    if value < 0 || value > i64::from(max) {
        return Err(out_of_range(field, value, max));
    }

    Ok(value as u8)
}

pub(crate) fn out_of_range(field: &str, value: i64, max: u8) -> Error {
    if field == DATACENTER_ID_FIELD {
        Error::InvalidDatacenterId {
            datacenter_id: value,
            max,
        }
    } else {
        Error::InvalidWorkerId {
            worker_id: value,
            max,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
