use chrono::{TimeZone, Utc};
use raster_core::plate::CustomPlate;
use raster_core::record::{
    MethodSummary, RUN_INFO_FILE, SELECTED_WELLS_FILE, TIMING_CSV_FILE, WellMapping,
};
use raster_core::{
    JsonRecordSink, PlateConfig, PlateType, RunOutcome, RunRecord, RunRecordSink, WellTiming,
};
use tempfile::tempdir;

fn record() -> RunRecord {
    RunRecord {
        name: "slide_run".into(),
        plate_type: PlateType::Dual44,
        total_wells: PlateConfig::Dual44.total_wells(),
        selected_wells: vec!["D11".into(), "A01".into(), "E03".into()],
        outcome: RunOutcome::Completed,
        run_start_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
        well_timing: vec![
            WellTiming {
                label: "D11".into(),
                start_s: Some(0.0),
                end_s: Some(1.5),
            },
            WellTiming {
                label: "A01".into(),
                start_s: Some(2.5),
                end_s: Some(4.0),
            },
            WellTiming {
                label: "E03".into(),
                start_s: Some(5.0),
                end_s: None,
            },
        ],
        method: Some(MethodSummary {
            per_well_dwell_s: 1.5,
            scans_per_well: 7,
            x_step_mm: 0.714286,
        }),
        custom_plate_config: None,
        well_mapping: Vec::new(),
    }
}

#[test]
fn reload_preserves_label_order_and_values() {
    let r = record();
    let back = RunRecord::from_json(&r.to_json().unwrap()).unwrap();
    assert_eq!(back.selected_wells, r.selected_wells);
    assert_eq!(back, r);
}

#[test]
fn json_uses_viewer_plate_names() {
    let json = record().to_json().unwrap();
    assert!(json.contains("\"plate_type\": \"44-well\""), "{json}");
    assert!(!json.contains("well_mapping"));
}

#[test]
fn sink_writes_run_directory() {
    let dir = tempdir().unwrap();
    let mut sink = JsonRecordSink::new(dir.path());
    let r = record();
    sink.accept(&r).unwrap();

    let run_dir = dir.path().join("slide_run.raw");
    let reloaded = RunRecord::load(&run_dir.join(RUN_INFO_FILE)).unwrap();
    assert_eq!(reloaded.selected_wells, r.selected_wells);

    let txt = std::fs::read_to_string(run_dir.join(SELECTED_WELLS_FILE)).unwrap();
    assert_eq!(txt, "Selected Wells:\nD11\nA01\nE03");

    let csv = std::fs::read_to_string(run_dir.join(TIMING_CSV_FILE)).unwrap();
    assert_eq!(
        csv,
        "well,start_s,end_s\nD11,0.0,1.5\nA01,2.5,4.0\nE03,5.0,\n"
    );
}

#[test]
fn custom_plate_record_carries_mapping() {
    let mut r = record();
    r.plate_type = PlateType::Custom;
    r.custom_plate_config = Some(CustomPlate {
        print_height: 26.0,
        print_width: 76.0,
        offset_x: 5.0,
        offset_y: 23.0,
        spot_distance_x: 3.0,
        spot_distance_y: 3.0,
        spot_diameter: 2.0,
        num_rows: 16,
        num_columns: 6,
    });
    r.well_mapping = vec![WellMapping {
        spot_id: "Spot_16".into(),
        row: 2,
        col: 3,
        x_position_mm: 14.0,
        y_position_mm: 29.0,
        spot_diameter_mm: 2.0,
    }];
    let json = r.to_json().unwrap();
    assert!(json.contains("\"spot_id\": \"Spot_16\""));
    assert_eq!(RunRecord::from_json(&json).unwrap(), r);
}

#[test]
fn loading_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = RunRecord::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<raster_core::RasterError>(),
        Some(raster_core::RasterError::Io(_))
    ));
}
