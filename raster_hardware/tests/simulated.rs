use std::path::Path;

use raster_hardware::{HwError, QueueFileSink, SimulatedStage};
use raster_traits::{AcquisitionSink, MotionDriver};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn stage_tracks_position_and_homes() {
    let mut s = SimulatedStage::new();
    s.initiate().unwrap();
    s.go_to_position(800, 7400).unwrap();
    assert_eq!(s.position(), (800, 7400));
    s.go_home().unwrap();
    assert_eq!(s.position(), (0, 0));
    assert!(s.is_initiated());
}

#[rstest]
#[case(-1, 10)]
#[case(10, 20_001)]
fn stage_rejects_moves_outside_travel(#[case] x: i64, #[case] y: i64) {
    let mut s = SimulatedStage::new().with_travel(20_000, 20_000);
    let err = s.go_to_position(x, y).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::OutOfTravel(..))
    ));
}

#[rstest]
fn injected_fault_after_n_moves() {
    let mut s = SimulatedStage::new().fail_after_moves(2);
    s.go_to_position(1, 1).unwrap();
    s.go_to_position(2, 2).unwrap();
    assert!(s.go_to_position(3, 3).is_err());
    assert_eq!(s.position(), (2, 2));
}

#[rstest]
fn queue_file_has_header_and_single_row() {
    let dir = tempdir().unwrap();
    let queue = dir.path().join("queue");
    let mut sink = QueueFileSink::new(&queue, None);
    sink.enqueue("plate1", Path::new("methods/desi.exp"), Path::new("data"))
        .unwrap();

    let text = std::fs::read_to_string(queue.join("plate1.raw.txt")).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines[0],
        "INDEX\tFILE_NAME\tFILE_TEXT\tMS_FILE\tMS_TUNE_FILE\tPROCESS\tPROCESS_PARAMS"
    );
    let raw = Path::new("data").join("plate1.raw");
    assert_eq!(
        lines[1],
        format!(
            "1\t\"{}\"\t\"HT-DESI\"\t\"methods/desi.exp\"\t\"\"\t\"\"\t\"\"",
            raw.display()
        )
    );
    assert_eq!(lines.len(), 2);

    // Without a stop command, stop only logs.
    sink.stop().unwrap();
}

#[rstest]
fn empty_file_name_is_queue_error() {
    let dir = tempdir().unwrap();
    let mut sink = QueueFileSink::new(dir.path(), None);
    let err = sink.enqueue(" ", Path::new("m.exp"), Path::new("d")).unwrap_err();
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Queue(_))));
}

#[cfg(unix)]
#[rstest]
fn failing_stop_command_is_reported() {
    let mut ok = QueueFileSink::new(".", Some("true".into()));
    ok.stop().unwrap();
    let mut bad = QueueFileSink::new(".", Some("false".into()));
    let err = bad.stop().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::StopCommand(_))
    ));
}
