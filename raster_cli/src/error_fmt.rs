//! Human-readable error descriptions and structured JSON error formatting.

use raster_core::error::{BuildError, RasterError};

/// Exit code when the operator cancelled the run (Ctrl-C).
pub const EXIT_CANCELLED: i32 = 9;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDriver => {
                "What happened: No motion driver was provided to the run controller.\nLikely causes: The stage failed to initialize or was not wired into the builder.\nHow to fix: Ensure the stage driver is created and passed via with_driver(...).".to_string()
            }
            BuildError::MissingMethodUpdater => {
                "What happened: No method-file updater was provided to the run controller.\nLikely causes: The builder was not configured with with_method_updater(...).\nHow to fix: Wire an updater for the configured [method] file.".to_string()
            }
            BuildError::MissingRun => {
                "What happened: No run was configured.\nLikely causes: The builder was not given a plate, pattern and well selection.\nHow to fix: Pass the run via with_run(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid run configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or arguments, then rerun."
            ),
        };
    }

    if let Some(re) = err.downcast_ref::<RasterError>() {
        return match re {
            RasterError::NoWellsSelected => {
                "What happened: No wells were selected.\nLikely causes: Neither --wells nor --all was given.\nHow to fix: Pass --wells A01,A02 or --all.".to_string()
            }
            RasterError::InvalidAddress(detail) => format!(
                "What happened: A well address is not on this plate ({detail}).\nLikely causes: A label typo, or a label for a different plate type.\nHow to fix: Run `raster wells` to list valid labels for the configured plate."
            ),
            RasterError::DegenerateTiming(detail) => format!(
                "What happened: The per-well dwell is too short for the instrument scan ({detail}).\nLikely causes: Too few pattern points, a short timing.dwell_time_s, or a long FunctionScanTime.\nHow to fix: Raise timing.min_well_dwell_s or timing.dwell_time_s, or use a denser pattern."
            ),
            RasterError::MethodFile(detail) => format!(
                "What happened: The method file could not be read or rewritten ({detail}).\nLikely causes: Wrong [method].file path, or the file lacks FunctionScanTime/NoOfChannels for the configured mode.\nHow to fix: Check [method].file and [method].mode in the config."
            ),
            RasterError::MotionDriver(detail) => format!(
                "What happened: The stage reported a fault ({detail}).\nLikely causes: Stage not powered, move out of travel, or a wrong offset.\nHow to fix: Run `raster self-check`, then verify [offsets] and [stage] in the config."
            ),
            RasterError::Configuration(detail) => format!(
                "What happened: Configuration is invalid or incomplete ({detail}).\nLikely causes: A missing section (e.g. [custom_plate] for a custom plate) or an out-of-range value.\nHow to fix: Edit the TOML config and try again."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; anything untyped is 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(re) = err.downcast_ref::<RasterError>() {
        return match re {
            RasterError::NoWellsSelected => 3,
            RasterError::InvalidAddress(_) => 4,
            RasterError::DegenerateTiming(_) => 5,
            RasterError::MethodFile(_) => 6,
            RasterError::MotionDriver(_) => 7,
            RasterError::Configuration(_) => 8,
            RasterError::Acquisition(_) | RasterError::State(_) | RasterError::Io(_) => 1,
        };
    }
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return 8;
    }
    1
}

/// Short stable name of the error kind for JSON consumers.
pub fn error_reason_name(err: &eyre::Report) -> &'static str {
    if let Some(re) = err.downcast_ref::<RasterError>() {
        return match re {
            RasterError::InvalidAddress(_) => "InvalidAddress",
            RasterError::NoWellsSelected => "NoWellsSelected",
            RasterError::DegenerateTiming(_) => "DegenerateTiming",
            RasterError::MethodFile(_) => "MethodFileError",
            RasterError::MotionDriver(_) => "MotionDriverError",
            RasterError::Acquisition(_) => "AcquisitionError",
            RasterError::Configuration(_) => "ConfigurationError",
            RasterError::State(_) => "StateError",
            RasterError::Io(_) => "IoError",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "BuildError";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": error_reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
