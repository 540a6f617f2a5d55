use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use flakeshard_snowflake::{Snowflake, SnowflakeSettings};

const THREADS: usize = 8;
const IDS_PER_THREAD: usize = 10_000;

fn generator() -> Snowflake {
    let settings = SnowflakeSettings::builder()
        .datacenter_id(1)
        .worker_id(2)
        .build();
    Snowflake::new(settings).expect("generator should initialize")
}

#[test]
fn ids_from_shared_generator_are_unique_across_threads() {
    let generator = Arc::new(generator());

    let batches: Vec<Vec<u64>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = Arc::clone(&generator);
                s.spawn(move || {
                    (0..IDS_PER_THREAD)
                        .map(|_| generator.next_id().expect("clock should not roll back").to_raw())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("worker thread panicked"))
            .collect()
    });

    let mut seen = HashSet::with_capacity(THREADS * IDS_PER_THREAD);
    for batch in &batches {
        // Each thread observes its own ids in increasing order.
        assert!(batch.windows(2).all(|w| w[0] < w[1]));
        for id in batch {
            assert!(seen.insert(*id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn sequential_ids_are_strictly_increasing_and_decodable() {
    let generator = generator();

    let mut previous = None;
    for _ in 0..50_000 {
        let before = jiff::Timestamp::now().as_millisecond();
        let id = generator.next_id().expect("clock should not roll back");
        let after = jiff::Timestamp::now().as_millisecond();

        if let Some(previous) = previous {
            assert!(id > previous);
        }
        previous = Some(id);

        let embedded = generator
            .try_extract_timestamp(id.to_raw())
            .expect("generated ids embed a timestamp")
            .as_millisecond();
        assert!(before <= embedded && embedded <= after);
        assert!(id.to_raw() <= i64::MAX as u64);
        assert_eq!(id.datacenter_id(), 1);
        assert_eq!(id.worker_id(), 2);
    }
}
