//! Display loop against live workers

use std::time::Duration;

use fleetwatch_core::testing::{FakeHost, FakeTransport, RecordingRenderer};
use fleetwatch_core::{DisplayLoop, RowState, SENTINEL};

use super::common::start;

#[tokio::test]
async fn display_loop_renders_until_interrupted() {
    let transport = FakeTransport::new();
    transport.add_host("web", FakeHost::healthy());
    transport.add_host("db", FakeHost::unreachable());
    let handle = start(&transport, &["web", "db"]);

    let renderer = RecordingRenderer::new();
    let display = DisplayLoop::new(handle.store(), renderer.clone(), Duration::from_millis(20));
    let report = display
        .run(handle, tokio::time::sleep(Duration::from_millis(300)))
        .await;
    assert!(report.is_clean());

    let frames = renderer.frames();
    assert!(frames.len() >= 3, "only {} frames", frames.len());
    for frame in &frames {
        let names: Vec<_> = frame.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["web", "db"]);
    }

    let last = renderer.last().unwrap();
    assert_eq!(last.rows[0].state, RowState::Healthy);
    assert_eq!(last.rows[0].cpu, "25.3%");
    assert_eq!(last.rows[0].memory, "4.5/16.0GB");
    assert_eq!(last.rows[1].state, RowState::Failed);
    assert_eq!(last.rows[1].cpu, SENTINEL);
    assert_eq!(last.rows[1].status, "unreachable (x1)");
}

#[tokio::test]
async fn display_loop_stops_when_workers_are_cancelled() {
    let transport = FakeTransport::new();
    transport.add_host("web", FakeHost::healthy());
    let handle = start(&transport, &["web"]);
    let signal = handle.shutdown_signal();

    let renderer = RecordingRenderer::new();
    let display = DisplayLoop::new(handle.store(), renderer.clone(), Duration::from_millis(20));
    let task = tokio::spawn(display.run(handle, std::future::pending()));

    tokio::time::sleep(Duration::from_millis(60)).await;
    signal.cancel();
    let report = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("display loop should stop")
        .unwrap();
    assert!(report.is_clean());
    assert!(!renderer.frames().is_empty());
}
