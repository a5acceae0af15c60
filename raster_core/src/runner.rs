use std::time::Duration;

use raster_traits::{Clock, MotionDriver};

use crate::controller::RunController;
use crate::error::{RasterError, Result as CoreResult};
use crate::hw_error::{Source, map_hw_error};
use crate::record::RunRecord;
use crate::status::RunStatus;

/// Longest single sleep between steps, so a stop request is seen promptly.
pub const MAX_IDLE_SLICE: Duration = Duration::from_millis(50);

/// Start the controller and step it until it completes or is cancelled,
/// sleeping on the controller's clock between due callbacks.
///
/// A cancelled run is not an error here; check `RunRecord::outcome`.
pub fn run_to_completion(controller: &mut RunController) -> CoreResult<RunRecord> {
    controller.start()?;
    tracing::info!(name = %controller.run().name, "run start");

    loop {
        match controller.step()? {
            RunStatus::Running { next_in } => {
                if !next_in.is_zero() {
                    controller.clock.sleep(next_in.min(MAX_IDLE_SLICE));
                }
            }
            RunStatus::Completed | RunStatus::Cancelled => break,
        }
    }

    let record = controller.record().cloned().ok_or_else(|| {
        eyre::Report::new(RasterError::State("finished run has no record".into()))
    })?;
    tracing::info!(
        outcome = ?record.outcome,
        wells = record.completed_wells(),
        "run finished"
    );
    Ok(record)
}

/// Stage position visited by the self-check, in driver units.
pub const SELF_CHECK_POSITION: (i64, i64) = (3000, 3000);

/// Initialise the stage: initiate, settle, move out, return home.
pub fn self_check(driver: &mut dyn MotionDriver, clock: &dyn Clock) -> CoreResult<()> {
    let motion = |e: raster_traits::BoxError| {
        eyre::Report::new(map_hw_error(e.as_ref(), Source::Motion))
    };
    driver.initiate().map_err(motion)?;
    clock.sleep(Duration::from_secs(1));
    let (x, y) = SELF_CHECK_POSITION;
    driver.go_to_position(x, y).map_err(motion)?;
    driver.go_home().map_err(motion)?;
    tracing::info!("stage self-check complete");
    Ok(())
}
