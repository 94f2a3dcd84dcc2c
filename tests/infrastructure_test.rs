//! Test to verify test infrastructure works correctly

mod common;

use common::builders::FieldBuilder;
use common::mock_helpers::create_event_channel;
use surfscan::stream::{StreamEvent, StreamSink};
use surfscan::GridCoord;

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let field = FieldBuilder::new(3).base(10.0).absent(1, 1).build();

    assert_eq!(field.present_count(), 8);
    assert_eq!(field.get(GridCoord::new(0, 0)), Some(10.0));
    assert_eq!(field.get(GridCoord::new(1, 1)), None);
}

#[test]
fn test_event_channel() {
    let (mut sink, rx) = create_event_channel();
    sink.on_done();
    assert_eq!(rx.try_recv().unwrap(), StreamEvent::Done);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}

#[test]
#[should_panic(expected = "presence mismatch")]
fn test_field_comparison_detects_presence() {
    let a = FieldBuilder::new(2).build();
    let b = FieldBuilder::new(2).absent(0, 1).build();
    common::assert_fields_match(&a, &b, 1e-9);
}
