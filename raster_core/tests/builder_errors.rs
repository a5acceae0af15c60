use raster_core::error::BuildError;
use raster_core::mocks::{CallLog, RecordingDriver, StubMethodUpdater};
use raster_core::{Offsets, Pattern, PlateConfig, Run, RunController};
use rstest::rstest;

fn run(name: &str) -> Run {
    Run {
        name: name.into(),
        plate: PlateConfig::Standard96,
        offsets: Offsets::default(),
        pattern: Pattern::default(),
        selected_wells: PlateConfig::Standard96.slots(),
    }
}

#[rstest]
fn builder_missing_driver_yields_typed_build_error() {
    let log = CallLog::new();
    let err = RunController::builder()
        // missing with_driver()
        .with_method_updater(StubMethodUpdater::new(log))
        .with_run(run("x"))
        .try_build()
        .expect_err("should fail with MissingDriver");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingDriver) => {}
        other => panic!("expected MissingDriver, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_run_yields_typed_build_error() {
    let log = CallLog::new();
    let err = RunController::builder()
        .with_driver(RecordingDriver::new(log.clone()))
        .with_method_updater(StubMethodUpdater::new(log))
        .try_build()
        .expect_err("should fail with MissingRun");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingRun)
    ));
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_run_name_is_rejected(#[case] name: &str) {
    let log = CallLog::new();
    let err = RunController::builder()
        .with_driver(RecordingDriver::new(log.clone()))
        .with_method_updater(StubMethodUpdater::new(log))
        .with_run(run(name))
        .build()
        .expect_err("blank name");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}
