use crate::{
    clock::{Clock, SystemClock},
    config::{out_of_range, NodeConfig, DATACENTER_ID_FIELD, WORKER_ID_FIELD},
    error::{Error, Result},
    id::{
        try_extract_timestamp, SnowflakeId, DEFAULT_EPOCH, MAX_DATACENTER_ID,
        MAX_SEQUENCE, MAX_TIMESTAMP_MILLIS, MAX_WORKER_ID,
    },
};
use jiff::Timestamp;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

/// Configures a Snowflake generator instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SnowflakeSettings {
    /// Node-group index in the range `[0, 31]`.
    #[builder(default = 0)]
    pub datacenter_id: u8,
    /// Per-process index in the range `[0, 31]`.
    #[builder(default = 0)]
    pub worker_id: u8,
    /// Custom epoch used as the zero point for the 41-bit timestamp field.
    ///
    /// Every reader that extracts timestamps from ids must use the same epoch.
    #[builder(default = DEFAULT_EPOCH)]
    pub epoch: Timestamp,
}

impl SnowflakeSettings {
    /// Settings for a resolved node identity with the default epoch.
    pub fn from_node(node: NodeConfig) -> Self {
        Self::builder()
            .datacenter_id(node.datacenter_id)
            .worker_id(node.worker_id)
            .build()
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: Option<i64>,
    sequence: u16,
}

/// Snowflake ID generator.
///
/// Ids from one generator are unique and strictly increasing as long as the
/// clock never runs backwards. A backwards step is reported as
/// [`Error::ClockRollback`] instead of being waited out.
pub struct Snowflake<C: Clock = SystemClock> {
    epoch: Timestamp,
    datacenter_id: u8,
    worker_id: u8,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Snowflake<SystemClock> {
    /// Creates a generator backed by the real system clock.
    pub fn new(settings: SnowflakeSettings) -> Result<Self> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Snowflake<C> {
    /// Creates a generator reading time from `clock`.
    pub fn with_clock(settings: SnowflakeSettings, clock: C) -> Result<Self> {
        if settings.datacenter_id > MAX_DATACENTER_ID {
            return Err(out_of_range(
                DATACENTER_ID_FIELD,
                i64::from(settings.datacenter_id),
                MAX_DATACENTER_ID,
            ));
        }
        if settings.worker_id > MAX_WORKER_ID {
            return Err(out_of_range(
                WORKER_ID_FIELD,
                i64::from(settings.worker_id),
                MAX_WORKER_ID,
            ));
        }

        let now = clock.now();
        if settings.epoch > now {
            return Err(Error::EpochAhead {
                epoch: settings.epoch,
                now,
            });
        }

        info!(
            datacenter_id = settings.datacenter_id,
            worker_id = settings.worker_id,
            epoch = %settings.epoch,
            "snowflake generator initialized"
        );

        Ok(Self {
            epoch: settings.epoch,
            datacenter_id: settings.datacenter_id,
            worker_id: settings.worker_id,
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    pub fn epoch(&self) -> Timestamp {
        self.epoch
    }

    pub fn datacenter_id(&self) -> u8 {
        self.datacenter_id
    }

    pub fn worker_id(&self) -> u8 {
        self.worker_id
    }

    /// Generates the next unique id.
    ///
    /// - if the per-millisecond sequence is exhausted, wait for the next millisecond
    /// - if the clock moved backward, fail without touching the generator state
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;

        let mut now = self.clock.now().as_millisecond();
        let mut sequence = 0;

        if let Some(last) = state.last_millis {
            if now < last {
                let error = Error::ClockRollback {
                    last: millis_to_timestamp(last)?,
                    now: millis_to_timestamp(now)?,
                };
                warn!(rollback_ms = last - now, "{error}");
                return Err(error);
            }

            if now == last {
                sequence = (state.sequence + 1) & MAX_SEQUENCE;
                if sequence == 0 {
                    // Per-millisecond sequence exhausted: the wrapped sequence
                    // is used on the first strictly later millisecond.
                    debug!(last_millis = last, "sequence exhausted, waiting for next millisecond");
                    now = self.wait_next_millis(last)?;
                }
            }
        }

        // Milliseconds elapsed since the custom epoch, used as the timestamp field.
        let elapsed = now - self.epoch.as_millisecond();
        if elapsed < 0 || elapsed as u64 > MAX_TIMESTAMP_MILLIS {
            return Err(Error::OverTimeLimit);
        }

        let id = SnowflakeId::new()
            .with_timestamp(elapsed as u64)
            .with_datacenter_id(self.datacenter_id)
            .with_worker_id(self.worker_id)
            .with_sequence(sequence);

        state.last_millis = Some(now);
        state.sequence = sequence;

        Ok(id)
    }

    /// Recovers the timestamp embedded in an id produced with this generator's epoch.
    pub fn try_extract_timestamp(&self, raw: u64) -> Option<Timestamp> {
        try_extract_timestamp(raw, self.epoch)
    }

    fn wait_next_millis(&self, last: i64) -> Result<i64> {
        let target = millis_to_timestamp(last + 1)?;
        loop {
            let now = self.clock.now().as_millisecond();
            if now > last {
                return Ok(now);
            }
            self.clock.wait_until(target);
        }
    }
}

fn millis_to_timestamp(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|_| Error::OverTimeLimit)
}
