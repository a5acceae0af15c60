use raster_config::{OffsetsCfg, PlateKind, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[method]
file = "methods/desi.exp"
"#;

#[test]
fn minimal_config_takes_defaults() {
    let cfg = load_toml(BASE).expect("parse");
    cfg.validate().expect("valid");
    assert_eq!(cfg.plate.kind, PlateKind::Standard96);
    assert!((cfg.offsets.startup_delay_s - 8.0).abs() < 1e-12);
    assert!((cfg.offsets.standard96.x - 10.0).abs() < 1e-12);
    assert!((cfg.offsets.slide_b.y - 45.0).abs() < 1e-12);
    assert_eq!(cfg.stage.approach_offset_units, 600);
    assert_eq!(cfg.stage.park_position, [20, 20]);
    assert_eq!(cfg.runner.between_wells_ms, 1000);
}

#[test]
fn method_section_is_required() {
    assert!(load_toml("[plate]\nkind = \"dual44\"\n").is_err());
}

#[test]
fn custom_kind_requires_custom_section() {
    let toml = format!("{BASE}\n[plate]\nkind = \"custom\"\n");
    let cfg = load_toml(&toml).expect("parse");
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains("[custom_plate]"), "{err}");
}

#[test]
fn custom_section_gets_dialog_defaults() {
    let toml = format!("{BASE}\n[plate]\nkind = \"custom\"\n[custom_plate]\nnum_rows = 4\n");
    let cfg = load_toml(&toml).expect("parse");
    cfg.validate().expect("valid");
    let c = cfg.custom_plate.expect("custom");
    assert_eq!(c.num_rows, 4);
    assert_eq!(c.num_columns, 6);
    assert!((c.spot_diameter - 2.0).abs() < 1e-12);
}

#[rstest]
#[case("[custom_plate]\nnum_rows = 0\n", "custom_plate.num_rows")]
#[case("[custom_plate]\nspot_diameter = 0.0\n", "custom_plate.spot_diameter")]
#[case("[custom_plate]\nnum_rows = 70000\n", "custom_plate.num_rows")]
#[case("[custom_plate]\nnum_columns = 4294967295\n", "custom_plate.num_columns")]
#[case("[offsets]\nstartup_delay_s = 90.0\n", "offsets.startup_delay_s")]
#[case("[timing]\ndwell_time_s = -1.0\n", "timing.dwell_time_s")]
#[case("[timing]\nmin_well_dwell_s = 0.0\n", "timing.min_well_dwell_s")]
#[case("[runner]\npoint_settle_ms = 120000\n", "runner.point_settle_ms")]
#[case("[stage]\nunits_per_mm = 0.0\n", "stage.units_per_mm")]
#[case("[stage]\napproach_offset_units = -5\n", "stage.approach_offset_units")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_out_of_range_values(#[case] extra: &str, #[case] needle: &str) {
    let toml = format!("{BASE}\n{extra}");
    let cfg = load_toml(&toml).expect("parse");
    let err = cfg.validate().unwrap_err().to_string();
    assert!(err.contains(needle), "expected {needle} in {err}");
}

#[test]
fn rejects_non_positive_scan_rate() {
    let toml = r#"
[method]
file = "m.exp"
mode = "multi_channel"
scans_per_second = 0.0
"#;
    let cfg = load_toml(toml).expect("parse");
    assert!(cfg.validate().unwrap_err().to_string().contains("method.scans_per_second"));
}

#[test]
fn shipped_config_is_valid() {
    let text = include_str!("../../etc/raster_config.toml");
    let cfg = load_toml(text).expect("parse shipped config");
    cfg.validate().expect("shipped config validates");
    assert_eq!(cfg.offsets, OffsetsCfg::default());
}
