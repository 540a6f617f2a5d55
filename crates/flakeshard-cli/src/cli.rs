use clap::{Parser, Subcommand};
use jiff::Timestamp;

pub const KEY_PREFIX_ENV: &str = "FLAKESHARD_KEY_PREFIX";
pub const TIME_ZONE_ENV: &str = "FLAKESHARD_TIME_ZONE";
pub const EPOCH_ENV: &str = "FLAKESHARD_EPOCH";

pub const DEFAULT_KEY_PREFIX: &str = "system:type:stock:";
pub const DEFAULT_EPOCH_RFC3339: &str = "2024-01-01T00:00:00Z";

#[derive(Debug, Parser)]
#[command(name = "flakeshard", about = "Generate snowflake ids and derive daily shard keys")]
pub struct CLI {
    /// Worker id in [0, 31]; falls back to FLAKESHARD_WORKER_ID, then 0.
    #[arg(long, global = true)]
    pub worker_id: Option<String>,

    /// Datacenter id in [0, 31]; falls back to FLAKESHARD_DATACENTER_ID, then 0.
    #[arg(long, global = true)]
    pub datacenter_id: Option<String>,

    #[arg(long, global = true, env = KEY_PREFIX_ENV, default_value = DEFAULT_KEY_PREFIX)]
    pub key_prefix: String,

    /// IANA time zone used to pick shard days; defaults to the system zone.
    #[arg(long, global = true, env = TIME_ZONE_ENV)]
    pub time_zone: Option<String>,

    /// Custom epoch shared by generated ids and every reader that decodes them.
    #[arg(long, global = true, env = EPOCH_ENV, default_value = DEFAULT_EPOCH_RFC3339)]
    pub epoch: Timestamp,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print newly generated ids, one per line.
    Generate {
        #[arg(long, short = 'n', default_value_t = 1)]
        count: usize,
    },
    /// Decompose an id into its fields.
    Inspect { id: u64 },
    /// Print the shard key an entity belongs to.
    ShardKey {
        #[arg(long)]
        type_id: u64,
        #[arg(long)]
        entity_id: Option<u64>,
        /// RFC 3339 creation time used when the entity id embeds no timestamp.
        #[arg(long)]
        created_at: Option<Timestamp>,
    },
    /// Print the shard keys of the most recent days, newest first.
    Recent {
        #[arg(long)]
        type_id: u64,
        #[arg(long)]
        days: Option<usize>,
    },
}
