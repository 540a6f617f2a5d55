use crate::error::{PartitionError, Result};
use crate::shard_key::ShardKey;
use flakeshard_snowflake::{try_extract_timestamp, Clock, SystemClock, DEFAULT_EPOCH};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Span, Timestamp};
use tracing::{trace, warn};
use typed_builder::TypedBuilder;

/// Number of daily shards scanned when no window is given.
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Upper bound on a recent window, roughly ten years of daily shards.
pub const MAX_WINDOW_DAYS: usize = 3_660;

/// Compact `yyyyMMdd` rendering of a shard day.
const DATE_FORMAT: &str = "%Y%m%d";

/// Configures how shard keys are rendered.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PartitionSettings {
    /// Prefix owned by the entity type, e.g. `"type_stock:"`.
    #[builder(setter(into))]
    pub key_prefix: String,
    /// Placed between the type id and the date.
    #[builder(default = ":".to_string(), setter(into))]
    pub separator: String,
    /// Zone whose calendar decides which day a timestamp belongs to.
    #[builder(default = TimeZone::system())]
    pub time_zone: TimeZone,
    /// Epoch of the snowflake generator whose ids are being sharded.
    #[builder(default = DEFAULT_EPOCH)]
    pub epoch: Timestamp,
    /// Window used by [`PartitionKeyDeriver::recent_shard_keys_default`].
    #[builder(default = DEFAULT_WINDOW_DAYS)]
    pub window_days: usize,
}

/// Derives daily shard keys from snowflake ids, timestamps or dates.
///
/// The deriver holds no mutable state; the clock is only read to find "today".
#[derive(Debug, Clone)]
pub struct PartitionKeyDeriver<C: Clock = SystemClock> {
    settings: PartitionSettings,
    clock: C,
}

impl PartitionKeyDeriver<SystemClock> {
    /// Creates a deriver that anchors recent windows on the system clock.
    pub fn new(settings: PartitionSettings) -> Result<Self> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> PartitionKeyDeriver<C> {
    pub fn with_clock(settings: PartitionSettings, clock: C) -> Result<Self> {
        if settings.key_prefix.is_empty() {
            return Err(PartitionError::EmptyKeyPrefix);
        }
        Ok(Self { settings, clock })
    }

    pub fn settings(&self) -> &PartitionSettings {
        &self.settings
    }

    /// Shard key for the day `timestamp` falls on in the configured zone.
    pub fn shard_key(&self, type_id: u64, timestamp: Timestamp) -> ShardKey {
        let day = self.settings.time_zone.to_datetime(timestamp).date();
        self.shard_key_for_date(type_id, day)
    }

    /// Shard key for a calendar day, bypassing any time zone conversion.
    pub fn shard_key_for_date(&self, type_id: u64, day: Date) -> ShardKey {
        ShardKey::new(format!(
            "{}{}{}{}",
            self.settings.key_prefix,
            type_id,
            self.settings.separator,
            day.strftime(DATE_FORMAT)
        ))
    }

    /// Shard key for an entity.
    ///
    /// The day comes from the timestamp embedded in `entity_id`. Ids that do
    /// not embed one fall back to `fallback_created_at`, then to the current time.
    pub fn resolve_shard_key(
        &self,
        type_id: u64,
        entity_id: Option<u64>,
        fallback_created_at: Option<Timestamp>,
    ) -> ShardKey {
        let extracted = entity_id.and_then(|id| try_extract_timestamp(id, self.settings.epoch));

        let timestamp = match (extracted, fallback_created_at) {
            (Some(timestamp), _) => {
                trace!(type_id, entity_id, %timestamp, "shard resolved from entity id");
                timestamp
            }
            (None, Some(created_at)) => {
                trace!(type_id, entity_id, %created_at, "shard resolved from creation time");
                created_at
            }
            (None, None) => {
                let now = self.clock.now();
                trace!(type_id, entity_id, %now, "shard resolved from current time");
                now
            }
        };

        self.shard_key(type_id, timestamp)
    }

    /// Keys for today back to `window_days - 1` days ago, newest first.
    ///
    /// Windows longer than [`MAX_WINDOW_DAYS`] are clamped to it.
    pub fn recent_shard_keys(&self, type_id: u64, window_days: usize) -> Vec<ShardKey> {
        let window_days = if window_days > MAX_WINDOW_DAYS {
            warn!(
                requested = window_days,
                max = MAX_WINDOW_DAYS,
                "recent shard window clamped"
            );
            MAX_WINDOW_DAYS
        } else {
            window_days
        };

        // The series ends early only at the minimum date jiff can represent.
        self.today()
            .series(Span::new().days(-1))
            .take(window_days)
            .map(|day| self.shard_key_for_date(type_id, day))
            .collect()
    }

    /// [`recent_shard_keys`](Self::recent_shard_keys) over the configured window.
    pub fn recent_shard_keys_default(&self, type_id: u64) -> Vec<ShardKey> {
        self.recent_shard_keys(type_id, self.settings.window_days)
    }

    /// The current calendar day in the configured zone.
    pub fn today(&self) -> Date {
        self.settings.time_zone.to_datetime(self.clock.now()).date()
    }
}

/// Looks up an IANA time zone such as `"Asia/Shanghai"`.
///
/// `UTC` resolves even on hosts without a time zone database.
pub fn time_zone_from_name(name: &str) -> Result<TimeZone> {
    if name.eq_ignore_ascii_case("UTC") {
        return Ok(TimeZone::UTC);
    }
    TimeZone::get(name).map_err(|source| PartitionError::UnknownTimeZone {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flakeshard_snowflake::clock::test_clock::TestClock;
    use flakeshard_snowflake::SnowflakeId;
    use jiff::civil::date;
    use jiff::tz::offset;
    use std::collections::HashSet;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn deriver_at(now: &str, time_zone: TimeZone) -> PartitionKeyDeriver<TestClock> {
        let settings = PartitionSettings::builder()
            .key_prefix("type_stock:")
            .time_zone(time_zone)
            .build();
        PartitionKeyDeriver::with_clock(settings, TestClock::new(ts(now))).unwrap()
    }

    fn utc_deriver() -> PartitionKeyDeriver<TestClock> {
        deriver_at("2024-06-10T12:00:00Z", TimeZone::UTC)
    }

    #[test]
    fn shard_key_for_date_is_deterministic() {
        let deriver = utc_deriver();
        let key = deriver.shard_key_for_date(7, date(2024, 6, 1));
        assert_eq!(key, "type_stock:7:20240601");
        assert_eq!(deriver.shard_key_for_date(7, date(2024, 6, 1)), key);
    }

    #[test]
    fn same_day_timestamps_share_a_key() {
        let deriver = utc_deriver();
        let morning = deriver.shard_key(7, ts("2024-06-01T00:00:00Z"));
        let night = deriver.shard_key(7, ts("2024-06-01T23:59:59.999Z"));
        assert_eq!(morning, night);
        assert_eq!(morning, "type_stock:7:20240601");
    }

    #[test]
    fn day_boundary_changes_the_key() {
        let deriver = utc_deriver();
        let before = deriver.shard_key(7, ts("2024-06-01T23:59:59Z"));
        let after = deriver.shard_key(7, ts("2024-06-02T00:00:01Z"));
        assert_ne!(before, after);
        assert_eq!(after, "type_stock:7:20240602");
    }

    #[test]
    fn configured_zone_decides_the_day() {
        let deriver = deriver_at("2024-06-10T12:00:00Z", TimeZone::fixed(offset(8)));
        let key = deriver.shard_key(3, ts("2024-06-01T16:30:00Z"));
        assert_eq!(key, "type_stock:3:20240602");
    }

    #[test]
    fn custom_separator_is_used() {
        let settings = PartitionSettings::builder()
            .key_prefix("video:")
            .separator("/")
            .time_zone(TimeZone::UTC)
            .build();
        let deriver = PartitionKeyDeriver::new(settings).unwrap();
        assert_eq!(
            deriver.shard_key_for_date(12, date(2025, 1, 31)),
            "video:12/20250131"
        );
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let settings = PartitionSettings::builder().key_prefix("").build();
        assert!(matches!(
            PartitionKeyDeriver::new(settings),
            Err(PartitionError::EmptyKeyPrefix)
        ));
    }

    #[test]
    fn resolve_prefers_timestamp_embedded_in_id() {
        let deriver = utc_deriver();
        let created = ts("2024-06-03T08:00:00Z");
        let elapsed = created.as_millisecond() - DEFAULT_EPOCH.as_millisecond();
        let id = SnowflakeId::new()
            .with_timestamp(elapsed as u64)
            .with_worker_id(1)
            .with_sequence(5);

        let key = deriver.resolve_shard_key(7, Some(id.to_raw()), Some(ts("2020-01-01T00:00:00Z")));
        assert_eq!(key, deriver.shard_key(7, created));
        assert_eq!(key, "type_stock:7:20240603");
    }

    #[test]
    fn resolve_falls_back_to_creation_time() {
        let deriver = utc_deriver();
        let created = ts("2024-05-20T10:00:00Z");

        assert_eq!(
            deriver.resolve_shard_key(7, None, Some(created)),
            deriver.shard_key(7, created)
        );
        // Small legacy ids carry no timestamp.
        assert_eq!(
            deriver.resolve_shard_key(7, Some(12_345), Some(created)),
            "type_stock:7:20240520"
        );
    }

    #[test]
    fn resolve_falls_back_to_now() {
        let deriver = utc_deriver();
        assert_eq!(deriver.resolve_shard_key(7, None, None), "type_stock:7:20240610");
        assert_eq!(deriver.resolve_shard_key(7, Some(0), None), "type_stock:7:20240610");
    }

    #[test]
    fn recent_window_is_descending_without_gaps() {
        let deriver = deriver_at("2024-03-02T09:00:00Z", TimeZone::UTC);
        let keys = deriver.recent_shard_keys(7, 7);

        let expected = [
            "type_stock:7:20240302",
            "type_stock:7:20240301",
            "type_stock:7:20240229",
            "type_stock:7:20240228",
            "type_stock:7:20240227",
            "type_stock:7:20240226",
            "type_stock:7:20240225",
        ];
        assert_eq!(keys.len(), expected.len());
        for (key, expected) in keys.iter().zip(expected) {
            assert_eq!(key, expected);
        }

        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn recent_window_anchors_on_zone_today() {
        // 23:30 UTC is already the next day at UTC+8.
        let deriver = deriver_at("2024-06-01T23:30:00Z", TimeZone::fixed(offset(8)));
        assert_eq!(deriver.today(), date(2024, 6, 2));
        assert_eq!(deriver.recent_shard_keys(1, 1)[0], "type_stock:1:20240602");
    }

    #[test]
    fn default_window_is_seven_days() {
        let deriver = utc_deriver();
        let keys = deriver.recent_shard_keys_default(7);
        assert_eq!(keys.len(), DEFAULT_WINDOW_DAYS);
        assert_eq!(keys[0], "type_stock:7:20240610");
        assert_eq!(keys[6], "type_stock:7:20240604");
    }

    #[test]
    fn empty_window_yields_no_keys() {
        assert!(utc_deriver().recent_shard_keys(7, 0).is_empty());
    }

    #[test]
    fn oversized_window_is_clamped() {
        let deriver = utc_deriver();
        let keys = deriver.recent_shard_keys(7, usize::MAX);
        assert_eq!(keys.len(), MAX_WINDOW_DAYS);
        assert_eq!(keys[0], "type_stock:7:20240610");

        let oldest = date(2024, 6, 10)
            .checked_sub(Span::new().days(MAX_WINDOW_DAYS as i64 - 1))
            .unwrap();
        assert_eq!(
            keys[MAX_WINDOW_DAYS - 1],
            deriver.shard_key_for_date(7, oldest)
        );
        assert_eq!(deriver.recent_shard_keys(7, MAX_WINDOW_DAYS + 1).len(), MAX_WINDOW_DAYS);
    }

    #[test]
    fn settings_are_exposed() {
        let deriver = utc_deriver();
        assert_eq!(deriver.settings().key_prefix, "type_stock:");
        assert_eq!(deriver.settings().separator, ":");
        assert_eq!(deriver.settings().epoch, DEFAULT_EPOCH);
        assert_eq!(deriver.settings().window_days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn utc_resolves_without_tz_database() {
        let tz = time_zone_from_name("UTC").unwrap();
        assert_eq!(tz.to_datetime(ts("2024-06-01T23:30:00Z")).date(), date(2024, 6, 1));
        assert!(time_zone_from_name("utc").is_ok());
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let err = time_zone_from_name("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, PartitionError::UnknownTimeZone { ref name, .. } if name == "Mars/Olympus_Mons"));
    }
}
