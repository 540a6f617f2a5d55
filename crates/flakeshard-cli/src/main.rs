mod cli;

use crate::cli::{Command, CLI};
use anyhow::Context;
use clap::Parser;
use flakeshard_partition::{time_zone_from_name, PartitionKeyDeriver, PartitionSettings};
use flakeshard_snowflake::{NodeConfig, Snowflake, SnowflakeId, SnowflakeSettings};
use jiff::Timestamp;
use jiff::tz::TimeZone;
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // stdout carries the command output, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = CLI::parse();
    let stdout = std::io::stdout();
    run(config, &mut stdout.lock())
}

fn run<W: Write>(config: CLI, out: &mut W) -> anyhow::Result<()> {
    match config.command {
        Command::Generate { count } => {
            let node = NodeConfig::resolve(config.worker_id.as_deref(), config.datacenter_id.as_deref())
                .context("invalid node identity")?;
            info!(
                datacenter_id = node.datacenter_id,
                worker_id = node.worker_id,
                epoch = %config.epoch,
                count,
                "generating ids"
            );

            let settings = SnowflakeSettings::builder()
                .datacenter_id(node.datacenter_id)
                .worker_id(node.worker_id)
                .epoch(config.epoch)
                .build();
            let generator = Snowflake::new(settings)?;
            for _ in 0..count {
                writeln!(out, "{}", generator.next_id()?)?;
            }
        }
        Command::Inspect { id } => {
            let decoded = SnowflakeId::from(id);
            match decoded.timestamp_at(config.epoch) {
                Some(timestamp) => {
                    writeln!(out, "timestamp:     {timestamp}")?;
                    writeln!(out, "datacenter_id: {}", decoded.datacenter_id())?;
                    writeln!(out, "worker_id:     {}", decoded.worker_id())?;
                    writeln!(out, "sequence:      {}", decoded.sequence())?;
                }
                None => writeln!(out, "{id} does not embed a timestamp")?,
            }
        }
        Command::ShardKey {
            type_id,
            entity_id,
            created_at,
        } => {
            let deriver = deriver(&config.key_prefix, config.time_zone.as_deref(), config.epoch)?;
            writeln!(out, "{}", deriver.resolve_shard_key(type_id, entity_id, created_at))?;
        }
        Command::Recent { type_id, days } => {
            let deriver = deriver(&config.key_prefix, config.time_zone.as_deref(), config.epoch)?;
            let keys = match days {
                Some(days) => deriver.recent_shard_keys(type_id, days),
                None => deriver.recent_shard_keys_default(type_id),
            };
            for key in keys {
                writeln!(out, "{key}")?;
            }
        }
    }

    Ok(())
}

fn deriver(
    key_prefix: &str,
    time_zone: Option<&str>,
    epoch: Timestamp,
) -> anyhow::Result<PartitionKeyDeriver> {
    let time_zone = match time_zone {
        Some(name) => time_zone_from_name(name)?,
        None => TimeZone::system(),
    };
    let settings = PartitionSettings::builder()
        .key_prefix(key_prefix)
        .time_zone(time_zone)
        .epoch(epoch)
        .build();
    let deriver = PartitionKeyDeriver::new(settings)?;

    let settings = deriver.settings();
    info!(
        key_prefix = %settings.key_prefix,
        time_zone = settings.time_zone.iana_name().unwrap_or("system"),
        epoch = %settings.epoch,
        "deriving shard keys"
    );
    Ok(deriver)
}
