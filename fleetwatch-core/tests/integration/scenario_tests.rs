//! End-to-end polling scenarios

use std::time::{Duration, Instant};

use fleetwatch_core::testing::{FakeHost, FakeTransport};
use fleetwatch_core::{DisplayRow, FailureReason, HostStatus, SENTINEL, SnapshotEntry};

use super::common::{start, wait_for};

/// A healthy and B unreachable: A shows its sample, B is failed once
#[tokio::test]
async fn healthy_and_unreachable_hosts_settle_independently() {
    let transport = FakeTransport::new();
    transport.add_host("A", FakeHost::healthy());
    transport.add_host("B", FakeHost::unreachable());
    let handle = start(&transport, &["A", "B"]);

    let snapshot = handle.wait_until_settled(Duration::from_secs(2)).await;
    assert!(snapshot.all_settled());
    let names: Vec<_> = snapshot.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);

    let a = snapshot.get("A").and_then(HostStatus::sample).expect("A healthy");
    assert!((a.cpu_percent - 25.3).abs() < 1e-9);
    assert!((a.mem_used_gb - 4.5).abs() < 1e-9);
    assert!((a.mem_total_gb - 16.0).abs() < 1e-9);
    assert!((a.disk_used - 50.0).abs() < 1e-9);
    assert!((a.disk_total - 100.0).abs() < 1e-9);

    match snapshot.get("B") {
        Some(HostStatus::Failed(info)) => {
            assert_eq!(info.reason, FailureReason::Unreachable);
            assert_eq!(info.consecutive_failures, 1);
        }
        other => panic!("B should be failed, got {other:?}"),
    }

    let report = handle.shutdown().await;
    assert!(report.is_clean());
    assert_eq!(report.completed, 2);
}

/// A succeeds twice, then its session starts dropping commands
#[tokio::test]
async fn dropped_session_discards_previous_sample() {
    let transport = FakeTransport::new();
    transport.add_host("A", FakeHost::healthy().drop_after_runs(6));
    let handle = start(&transport, &["A"]);
    let store = handle.store();

    wait_for(&store, "A", Duration::from_secs(2), HostStatus::is_healthy).await;
    let status = wait_for(&store, "A", Duration::from_secs(2), HostStatus::is_failed).await;

    assert_eq!(status.consecutive_failures(), 1);
    let HostStatus::Failed(info) = &status else {
        unreachable!()
    };
    assert_eq!(info.reason, FailureReason::Transport);

    let row = DisplayRow::from_entry(&SnapshotEntry {
        name: "A".into(),
        status: status.clone(),
    });
    assert_eq!(row.cpu, SENTINEL);
    assert_eq!(row.memory, SENTINEL);
    assert_eq!(row.disk, SENTINEL);

    let stats = transport.stats("A");
    assert_eq!(stats.connects, 1);
    assert_eq!(stats.runs, 7);
    assert_eq!(stats.closes, 1);

    handle.shutdown().await;
}

/// Shutdown while every worker sleeps its backoff returns within the grace
/// period and no remote call follows it
#[tokio::test]
async fn shutdown_during_backoff_is_prompt_and_final() {
    let transport = FakeTransport::new();
    for name in ["x", "y", "z"] {
        transport.add_host(name, FakeHost::unreachable());
    }
    let handle = start(&transport, &["x", "y", "z"]);
    let snapshot = handle.wait_until_settled(Duration::from_secs(2)).await;
    assert_eq!(snapshot.failed_count(), 3);

    let started = Instant::now();
    let report = handle.shutdown().await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(report.is_clean());
    assert_eq!(report.completed, 3);

    let calls = transport.total_calls();
    assert_eq!(calls, 3);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.total_calls(), calls);
}

/// Shutdown interrupts a command that would otherwise run far past the grace
#[tokio::test]
async fn shutdown_interrupts_slow_command() {
    let transport = FakeTransport::new();
    transport.add_host("slow", FakeHost::healthy().with_run_delay(Duration::from_secs(30)));
    let handle = start(&transport, &["slow"]);

    let store = handle.store();
    let started = Instant::now();
    while transport.stats("slow").runs == 0 {
        assert!(started.elapsed() < Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let report = handle.shutdown().await;
    assert!(report.is_clean());
    assert_eq!(store.get("slow").unwrap(), HostStatus::Connecting);
    assert_eq!(transport.stats("slow").closes, 1);
}

/// A healthy host keeps one session across many cycles
#[tokio::test]
async fn healthy_host_reuses_its_session() {
    let transport = FakeTransport::new();
    transport.add_host("A", FakeHost::healthy());
    let handle = start(&transport, &["A"]);

    let started = Instant::now();
    while transport.stats("A").runs < 12 {
        assert!(started.elapsed() < Duration::from_secs(3));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.shutdown().await;

    assert_eq!(transport.stats("A").connects, 1);
}

/// One host failing does not hold back the other's refreshes
#[tokio::test]
async fn slow_host_does_not_block_others() {
    let transport = FakeTransport::new();
    transport.add_host("fast", FakeHost::healthy());
    transport.add_host(
        "stuck",
        FakeHost::healthy().with_connect_delay(Duration::from_secs(30)),
    );
    let handle = start(&transport, &["stuck", "fast"]);
    let store = handle.store();

    wait_for(&store, "fast", Duration::from_secs(2), HostStatus::is_healthy).await;
    assert_eq!(store.get("stuck").unwrap(), HostStatus::Connecting);

    let report = handle.shutdown().await;
    assert!(report.is_clean());
}

/// A host whose output stops parsing is marked failed with a parse reason
#[tokio::test]
async fn unparseable_output_marks_host_failed() {
    let transport = FakeTransport::new();
    transport.add_host(
        "odd",
        FakeHost::healthy().with_memory_output("Mem: 100 200 0"),
    );
    let handle = start(&transport, &["odd"]);
    let store = handle.store();

    let status = wait_for(&store, "odd", Duration::from_secs(2), HostStatus::is_failed).await;
    let HostStatus::Failed(info) = status else {
        unreachable!()
    };
    assert_eq!(info.reason, FailureReason::Parse);
    assert_eq!(transport.stats("odd").closes, 1);

    handle.shutdown().await;
}
