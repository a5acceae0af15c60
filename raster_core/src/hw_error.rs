//! Maps `Box<dyn Error>` from collaborator boundaries to typed `RasterError`.
//!
//! The traits in `raster_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `raster_hardware::HwError` downcasting.

use crate::error::RasterError;

/// Which collaborator produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Motion,
    MethodFile,
    Acquisition,
}

/// Map a trait-boundary error to a typed `RasterError`.
///
/// Known hardware error types are downcast first; otherwise the error is
/// attributed to the collaborator it came from.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static), source: Source) -> RasterError {
    #[cfg(feature = "hardware-errors")]
    {
        use raster_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Queue(_) | HwError::StopCommand(_) => {
                    RasterError::Acquisition(hw.to_string())
                }
                HwError::Io(_) => attribute(hw.to_string(), source),
                HwError::Fault(_) | HwError::OutOfTravel(..) => {
                    RasterError::MotionDriver(hw.to_string())
                }
            };
        }
    }

    if let Some(typed) = e.downcast_ref::<RasterError>() {
        return typed.clone();
    }

    attribute(e.to_string(), source)
}

fn attribute(msg: String, source: Source) -> RasterError {
    match source {
        Source::Motion => RasterError::MotionDriver(msg),
        Source::MethodFile => RasterError::MethodFile(msg),
        Source::Acquisition => RasterError::Acquisition(msg),
    }
}
