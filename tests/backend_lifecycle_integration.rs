//! Integration tests for backend lifecycle
//!
//! These tests run the backend on a real thread and validate:
//! - Session start, streaming and completion reporting
//! - Cancellation and restart through commands
//! - Clean shutdown

mod common;

use common::builders::FieldBuilder;
use std::sync::Arc;
use std::time::{Duration, Instant};
use surfscan::backend::{AcquisitionBackend, AcquisitionMessage, FrontendHandle};
use surfscan::{HeightField, ScanOrder, SessionState, StreamParams};

/// Collect messages until `stop` matches one or the timeout expires
fn collect_until(
    frontend: &FrontendHandle,
    stop: impl Fn(&AcquisitionMessage) -> bool,
) -> Vec<AcquisitionMessage> {
    let deadline = Instant::now() + common::test_timeout();
    let mut messages = Vec::new();
    while Instant::now() < deadline {
        if let Ok(Some(msg)) = frontend.recv_timeout(Duration::from_millis(10)) {
            let done = stop(&msg);
            messages.push(msg);
            if done {
                return messages;
            }
        }
    }
    panic!("timed out; received {:?}", messages);
}

fn is_summary(msg: &AcquisitionMessage) -> bool {
    matches!(msg, AcquisitionMessage::Summary(_))
}

fn shared(field: HeightField) -> (Arc<HeightField>, Arc<ScanOrder>) {
    let order = ScanOrder::for_field(&field).unwrap();
    (Arc::new(field), Arc::new(order))
}

#[test]
fn test_backend_creation_and_shutdown() {
    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();

    frontend.shutdown();

    let result = handle.join();
    assert!(result.is_ok(), "Backend thread should exit cleanly");
    assert!(frontend
        .drain()
        .iter()
        .any(|m| matches!(m, AcquisitionMessage::Shutdown)));
}

#[test]
fn test_session_completes_and_rebuilds_field() {
    let truth = FieldBuilder::new(4).without_corners().build();
    let (field, order) = shared(truth.clone());

    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();
    frontend.start(field, order, StreamParams::new(2, 2));

    let messages = collect_until(&frontend, is_summary);

    assert!(matches!(
        messages[0],
        AcquisitionMessage::SessionStarted { total_points: 12, .. }
    ));

    let mut working = HeightField::absent(4).unwrap();
    let mut batches = 0;
    for msg in &messages {
        if let AcquisitionMessage::Batch(points) = msg {
            batches += 1;
            working.apply_points(points);
        }
    }
    assert_eq!(batches, 6);
    assert_eq!(working, truth);

    let n = messages.len();
    assert!(matches!(messages[n - 2], AcquisitionMessage::Done));
    match &messages[n - 1] {
        AcquisitionMessage::Summary(summary) => {
            assert_eq!(summary.state, SessionState::Completed);
            assert_eq!(summary.stats.batches_delivered, 6);
            assert!(summary.stats.finished_at.is_some());
        }
        other => panic!("expected summary, got {:?}", other),
    }

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_cancel_stops_batches() {
    let (field, order) = shared(FieldBuilder::new(20).build());

    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();
    frontend.start(field, order, StreamParams::new(1, 5));

    collect_until(&frontend, |m| matches!(m, AcquisitionMessage::Batch(_)));
    frontend.cancel();

    let tail = collect_until(&frontend, is_summary);
    match tail.last() {
        Some(AcquisitionMessage::Summary(summary)) => {
            assert_eq!(summary.state, SessionState::Cancelled);
            assert!(summary.stats.points_delivered < 400);
        }
        other => panic!("expected summary, got {:?}", other),
    }
    assert!(!tail.iter().any(|m| matches!(m, AcquisitionMessage::Done)));

    // Nothing follows the cancelled session's summary
    std::thread::sleep(Duration::from_millis(50));
    assert!(frontend.drain().is_empty());

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_cancel_zero_interval_session() {
    let (field, order) = shared(FieldBuilder::new(400).build());

    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();
    frontend.start(field, order, StreamParams::new(1, 0));

    collect_until(&frontend, |m| matches!(m, AcquisitionMessage::Batch(_)));
    frontend.cancel();

    let tail = collect_until(&frontend, is_summary);
    match tail.last() {
        Some(AcquisitionMessage::Summary(summary)) => {
            assert_eq!(summary.state, SessionState::Cancelled);
            assert!(summary.stats.points_delivered < 160_000);
        }
        other => panic!("expected summary, got {:?}", other),
    }
    assert!(!tail.iter().any(|m| matches!(m, AcquisitionMessage::Done)));

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_restart_attributes_batches_to_latest_session() {
    let (slow_field, slow_order) = shared(FieldBuilder::new(20).build());
    let (fast_field, fast_order) = shared(FieldBuilder::new(3).base(100.0).build());

    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();

    frontend.start(slow_field, slow_order, StreamParams::new(1, 60_000));
    frontend.start(fast_field, fast_order, StreamParams::new(3, 0));

    let messages = collect_until(&frontend, |m| {
        matches!(m, AcquisitionMessage::Summary(s) if s.state == SessionState::Completed)
    });

    let second_start = messages
        .iter()
        .rposition(|m| matches!(m, AcquisitionMessage::SessionStarted { .. }))
        .unwrap();
    assert!(messages[..second_start]
        .iter()
        .any(|m| matches!(m, AcquisitionMessage::Summary(s) if s.state == SessionState::Cancelled)));

    let heights: Vec<f64> = messages[second_start..]
        .iter()
        .filter_map(|m| match m {
            AcquisitionMessage::Batch(points) => Some(points.clone()),
            _ => None,
        })
        .flatten()
        .filter_map(|p| p.height)
        .collect();
    assert_eq!(heights.len(), 9);
    assert!(heights.iter().all(|&h| h >= 100.0));

    frontend.shutdown();
    handle.join().unwrap();
}

#[test]
fn test_invalid_start_reports_error() {
    let field = Arc::new(FieldBuilder::new(3).build());
    let wrong_order = Arc::new(ScanOrder::build(5).unwrap());

    let (backend, frontend) = AcquisitionBackend::new();
    let handle = backend.spawn().unwrap();
    frontend.start(field, wrong_order, StreamParams::default());

    let messages = collect_until(&frontend, |m| matches!(m, AcquisitionMessage::Error(_)));
    assert_eq!(messages.len(), 1);

    frontend.shutdown();
    handle.join().unwrap();
}
