//! Subcommand handlers: wire config, simulated hardware and the run controller.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use eyre::WrapErr;
use raster_config::{Config, PatternLibrary, Settings, SettingsStore, TomlSettingsStore};
use raster_core::error::{RasterError, Result};
use raster_core::{
    CanvasPoint, ControllerCfg, ExpMethodUpdater, JsonRecordSink, Offsets, Pattern,
    PlateConfig, Run, RunController, RunEvent, RunOutcome, TimingModel, WellAddress,
    format_duration, run_to_completion,
};
use raster_hardware::SimulatedStage;
use raster_hardware::queue::QueueFileSink;
use raster_traits::MonotonicClock;
use serde_json::json;

use crate::cli::WellSelection;
use crate::error_fmt::EXIT_CANCELLED;

/// Sim-only: fail every stage move after this many succeeded.
const ENV_SIM_FAIL_AFTER_MOVES: &str = "RASTER_TEST_SIM_FAIL_AFTER_MOVES";
/// Sim-only: request a stop once this many wells have completed.
const ENV_CANCEL_AFTER_WELLS: &str = "RASTER_TEST_CANCEL_AFTER_WELLS";

fn config_err(msg: impl Into<String>) -> eyre::Report {
    eyre::Report::new(RasterError::Configuration(msg.into()))
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read, parse and validate the config, then overlay persisted settings when the file exists.
pub fn load_config(path: &Path, settings: Option<&Path>) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_err(format!("read {}: {e}", path.display())))?;
    let mut cfg: Config = toml::from_str(&text)
        .map_err(|e| config_err(format!("parse {}: {e}", path.display())))?;

    if let Some(p) = settings
        && p.exists()
    {
        let loaded = TomlSettingsStore::new(p)
            .load()
            .map_err(|e| config_err(format!("{e:#}")))?;
        loaded.apply_to(&mut cfg);
        tracing::debug!(settings = %p.display(), "settings applied");
    }

    cfg.validate().map_err(|e| config_err(e.to_string()))?;
    Ok(cfg)
}

fn resolve_wells(plate: &PlateConfig, selection: &WellSelection) -> Result<Vec<WellAddress>> {
    if selection.all {
        return Ok(plate.slots());
    }
    let mut wells: Vec<WellAddress> = Vec::with_capacity(selection.wells.len());
    for label in &selection.wells {
        let addr = plate.address_from_label(label.trim())?;
        // One timing row per label; repeats keep their first position.
        if wells.iter().any(|w| w.label() == addr.label()) {
            tracing::warn!(well = %addr, "duplicate well in selection ignored");
            continue;
        }
        wells.push(addr);
    }
    Ok(wells)
}

fn load_pattern(library: Option<&Path>, name: Option<&str>) -> Result<Pattern> {
    let Some(name) = name else {
        return Ok(Pattern::default());
    };
    let path = library.ok_or_else(|| config_err("--pattern needs --patterns FILE"))?;
    let lib = PatternLibrary::open(path).map_err(|e| config_err(e.to_string()))?;
    let points = lib
        .get(name)
        .ok_or_else(|| config_err(format!("pattern '{name}' not found in {}", path.display())))?;
    Ok(points.iter().copied().map(CanvasPoint::from).collect())
}

fn build_run(
    cfg: &Config,
    name: &str,
    selection: &WellSelection,
    pattern: Option<&str>,
    patterns: Option<&Path>,
) -> Result<Run> {
    let plate = PlateConfig::try_from(cfg)?;
    let selected_wells = resolve_wells(&plate, selection)?;
    Ok(Run {
        name: name.to_string(),
        offsets: Offsets::from(&cfg.offsets),
        pattern: load_pattern(patterns, pattern)?,
        plate,
        selected_wells,
    })
}

/// `raster run`: returns the process exit code.
pub fn run_cmd(
    cfg: &Config,
    name: &str,
    selection: &WellSelection,
    pattern: Option<&str>,
    patterns: Option<&Path>,
    print_runtime: bool,
    json: bool,
) -> Result<i32> {
    let run = build_run(cfg, name, selection, pattern, patterns)?;

    let mut stage = SimulatedStage::new();
    if let Some(n) = env_usize(ENV_SIM_FAIL_AFTER_MOVES) {
        stage = stage.fail_after_moves(n);
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        if let Err(e) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            tracing::warn!(error = %e, "Ctrl-C handler not installed");
        }
    }

    let cancel_after = env_usize(ENV_CANCEL_AFTER_WELLS);
    let done = Arc::new(AtomicUsize::new(0));
    let progress = {
        let stop = stop.clone();
        let done = done.clone();
        move |event: &RunEvent| match event {
            RunEvent::WellStarted { index, label, .. } => {
                tracing::info!(well = index, label = %label, "well started");
            }
            RunEvent::WellCompleted { index, label, end_s } => {
                tracing::info!(well = index, label = %label, end_s, "well completed");
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                if cancel_after.is_some_and(|limit| n >= limit) {
                    stop.store(true, Ordering::SeqCst);
                }
            }
            RunEvent::StateChanged { from, to } => {
                tracing::debug!(from = %from, to = %to, "state");
            }
            RunEvent::PointVisited { .. } | RunEvent::Finished(_) => {}
        }
    };

    let stop_check = {
        let stop = stop.clone();
        move || stop.load(Ordering::SeqCst)
    };

    let mut controller = RunController::builder()
        .with_config(ControllerCfg::from(cfg))
        .with_driver(stage)
        .with_method_updater(ExpMethodUpdater::from(&cfg.method))
        .with_acquisition(QueueFileSink::new(
            cfg.acquisition.queue_directory.clone(),
            cfg.acquisition.stop_command.clone(),
        ))
        .with_record_sink(JsonRecordSink::new(cfg.acquisition.data_directory.clone()))
        .with_observer(progress)
        .with_stop_check(stop_check)
        .with_clock(MonotonicClock::new())
        .with_run(run)
        .build()?;

    let record = run_to_completion(&mut controller).wrap_err("acquisition run failed")?;
    let runtime_s = record
        .well_timing
        .iter()
        .filter_map(|t| t.end_s)
        .fold(0.0_f64, f64::max);
    let cancelled = record.outcome == RunOutcome::Cancelled;

    if json {
        println!(
            "{}",
            json!({
                "outcome": record.outcome,
                "name": record.name,
                "selected_wells": record.selected_wells.len(),
                "completed_wells": record.completed_wells(),
                "runtime_s": runtime_s,
            })
        );
    } else {
        let verb = if cancelled { "cancelled" } else { "complete" };
        println!(
            "Run '{}' {verb}: {}/{} wells.",
            record.name,
            record.completed_wells(),
            record.selected_wells.len()
        );
        if print_runtime {
            println!("Runtime: {}", format_duration(runtime_s));
        }
    }

    Ok(if cancelled { EXIT_CANCELLED } else { 0 })
}

/// `raster preview`: timing estimates only, no hardware.
pub fn preview_cmd(
    cfg: &Config,
    selection: &WellSelection,
    pattern: Option<&str>,
    patterns: Option<&Path>,
    json: bool,
) -> Result<()> {
    let plate = PlateConfig::try_from(cfg)?;
    let wells = resolve_wells(&plate, selection)?;
    let pattern = load_pattern(patterns, pattern)?;
    let timing = TimingModel::from(&cfg.timing);

    let per_well = timing.pattern_time(&pattern);
    let total = timing.total_run_time(wells.len(), &pattern);

    if json {
        println!(
            "{}",
            json!({
                "plate_type": plate.plate_type(),
                "wells": wells.len(),
                "points_per_well": pattern.len(),
                "pattern_time_s": per_well,
                "per_well_dwell_s": timing.per_well_dwell(&pattern),
                "total_s": total,
            })
        );
    } else {
        println!("Plate: {}", plate.plate_type());
        println!("Wells: {}", wells.len());
        println!("Points per well: {}", pattern.len());
        println!("Pattern time: {}", format_duration(per_well));
        println!("Total time: {}", format_duration(total));
    }
    Ok(())
}

/// `raster wells`: every slot with its centre in millimeters.
pub fn wells_cmd(cfg: &Config, json: bool) -> Result<()> {
    let plate = PlateConfig::try_from(cfg)?;
    let offsets = Offsets::from(&cfg.offsets);
    let mut rows = Vec::with_capacity(plate.total_wells());
    for well in plate.slots() {
        let c = plate.well_center_mm(&offsets, &well)?;
        rows.push((well, c));
    }

    if json {
        let list: Vec<_> = rows
            .iter()
            .map(|(w, c)| json!({ "label": w.label(), "x_mm": c.x, "y_mm": c.y }))
            .collect();
        println!("{}", serde_json::Value::Array(list));
    } else {
        for (w, c) in &rows {
            println!("{:<8} {:>8.3} {:>8.3}", w.label(), c.x, c.y);
        }
    }
    Ok(())
}

/// `raster set-offset`: persist one offset, seeding a new settings file from the config.
pub fn set_offset_cmd(
    cfg: &Config,
    settings: Option<&Path>,
    target: raster_config::OffsetTarget,
    x: f64,
    y: f64,
) -> Result<()> {
    let path = settings.ok_or_else(|| config_err("set-offset needs --settings FILE"))?;
    let store = TomlSettingsStore::new(path);
    let mut current = if path.exists() {
        store.load().map_err(|e| config_err(format!("{e:#}")))?
    } else {
        Settings::from_config(cfg)
    };
    current
        .set_offset(target, x, y)
        .map_err(|e| config_err(e.to_string()))?;
    store.save(&current)?;
    tracing::info!(?target, x, y, settings = %path.display(), "offset saved");
    println!("Saved {target:?} offset ({x}, {y}) to {}", path.display());
    Ok(())
}

/// `raster self-check`: initiate the simulated stage.
pub fn self_check_cmd() -> Result<()> {
    let mut stage = SimulatedStage::new();
    if let Some(n) = env_usize(ENV_SIM_FAIL_AFTER_MOVES) {
        stage = stage.fail_after_moves(n);
    }
    raster_core::self_check(&mut stage, &MonotonicClock::new())?;
    println!("Self-check OK");
    Ok(())
}
