//! Property tests for the snapshot store

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::Utc;
use fleetwatch_core::{FailureInfo, FailureReason, HostStatus, SnapshotStore};
use proptest::prelude::*;

fn failed(count: u32) -> HostStatus {
    HostStatus::Failed(FailureInfo {
        reason: FailureReason::Timeout,
        last_attempt: Utc::now(),
        consecutive_failures: count,
    })
}

const WRITES_PER_HOST: u32 = 1000;

/// K writers each own one host and write 1..=1000; a concurrent reader must
/// see every host in every snapshot, each host's count never goes backwards,
/// and the final state holds each writer's last value.
#[test]
fn concurrent_writers_never_tear_or_lose_entries() {
    const HOSTS: usize = 8;
    let names: Vec<String> = (0..HOSTS).map(|i| format!("host-{i}")).collect();
    let store = Arc::new(SnapshotStore::new(names.clone()));
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        let names = names.clone();
        thread::spawn(move || {
            let mut last_seen = vec![0u32; names.len()];
            let mut reads = 0usize;
            while !done.load(Ordering::Acquire) || reads == 0 {
                let snapshot = store.snapshot();
                assert_eq!(snapshot.len(), names.len());
                for (idx, entry) in snapshot.entries.iter().enumerate() {
                    assert_eq!(entry.name, names[idx]);
                    let count = entry.status.consecutive_failures();
                    assert!(count >= last_seen[idx], "count went backwards");
                    last_seen[idx] = count;
                }
                reads += 1;
            }
            reads
        })
    };

    let writers: Vec<_> = names
        .iter()
        .map(|name| {
            let store = Arc::clone(&store);
            let name = name.clone();
            thread::spawn(move || {
                for count in 1..=WRITES_PER_HOST {
                    store.set(&name, failed(count)).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    assert!(reader.join().unwrap() > 0);

    let snapshot = store.snapshot();
    for entry in &snapshot.entries {
        assert_eq!(entry.status.consecutive_failures(), WRITES_PER_HOST);
    }
}

proptest! {
    /// Property: the store always holds exactly the configured hosts, in order
    #[test]
    fn snapshot_contains_every_host_once(
        count in 1usize..20,
        writes in prop::collection::vec((0usize..20, 1u32..100), 0..50),
    ) {
        let names: Vec<String> = (0..count).map(|i| format!("h{i}")).collect();
        let store = SnapshotStore::new(names.clone());
        for (idx, value) in writes {
            let _ = store.set(&format!("h{idx}"), failed(value));
        }
        let snapshot = store.snapshot();
        let seen: Vec<String> = snapshot.entries.into_iter().map(|e| e.name).collect();
        prop_assert_eq!(seen, names);
    }

    /// Property: the last write to a host is the one observed
    #[test]
    fn last_write_wins(values in prop::collection::vec(1u32..1000, 1..30)) {
        let store = SnapshotStore::new(["only"]);
        for value in &values {
            store.set("only", failed(*value)).unwrap();
        }
        let expected = *values.last().unwrap();
        prop_assert_eq!(store.get("only").unwrap().consecutive_failures(), expected);
    }

    /// Property: writes to unknown hosts fail and leave the store unchanged
    #[test]
    fn unknown_hosts_never_added(name in "[a-z]{1,8}") {
        let store = SnapshotStore::new(["web-01"]);
        let before = store.snapshot().entries;
        prop_assert!(store.set(&name, failed(1)).is_err());
        prop_assert_eq!(store.snapshot().entries, before);
    }
}
