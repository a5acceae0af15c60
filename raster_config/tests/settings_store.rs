use raster_config::{
    CustomPlateCfg, OffsetTarget, PatternLibrary, PatternPoint, Settings, SettingsStore,
    TomlSettingsStore, load_toml,
};
use tempfile::tempdir;

#[test]
fn missing_settings_file_loads_defaults() {
    let dir = tempdir().unwrap();
    let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
    assert_eq!(store.load().unwrap(), Settings::default());
}

#[test]
fn offsets_round_trip_through_store_and_override_config() {
    let dir = tempdir().unwrap();
    let store = TomlSettingsStore::new(dir.path().join("nested/settings.toml"));

    let mut s = Settings::default();
    s.set_offset(OffsetTarget::SlideB, 47.5, 44.0).unwrap();
    s.set_startup_delay(2.0).unwrap();
    store.save(&s).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, s);

    let mut cfg = load_toml("[method]\nfile = \"m.exp\"\n").unwrap();
    loaded.apply_to(&mut cfg);
    assert!((cfg.offsets.slide_b.x - 47.5).abs() < 1e-12);
    assert!((cfg.offsets.slide_a.x - 46.0).abs() < 1e-12);
    assert!((cfg.offsets.startup_delay_s - 2.0).abs() < 1e-12);
}

#[test]
fn set_offset_rejects_non_finite() {
    let mut s = Settings::default();
    assert!(s.set_offset(OffsetTarget::Standard96, f64::NAN, 1.0).is_err());
    assert!((s.offsets.standard96.x - 10.0).abs() < 1e-12);
}

#[test]
fn invalid_custom_plate_is_not_stored() {
    let mut s = Settings::default();
    let bad = CustomPlateCfg {
        num_columns: 0,
        ..CustomPlateCfg::default()
    };
    assert!(s.set_custom_plate(bad).is_err());
    assert!(s.custom_plate.is_none());
}

#[test]
fn pattern_library_persists_and_deletes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("patterns.json");

    let mut lib = PatternLibrary::open(&path).unwrap();
    assert!(lib.is_empty());
    lib.save(
        "cross",
        vec![PatternPoint { x: 100.0, y: 20.0 }, PatternPoint { x: 100.0, y: 180.0 }],
    )
    .unwrap();
    assert!(lib.save("empty", Vec::new()).is_err());

    let reopened = PatternLibrary::open(&path).unwrap();
    assert_eq!(reopened.names().collect::<Vec<_>>(), vec!["cross"]);
    assert_eq!(reopened.get("cross").unwrap().len(), 2);

    let mut lib = reopened;
    assert!(lib.delete("cross").unwrap());
    assert!(!lib.delete("cross").unwrap());
    assert!(PatternLibrary::open(&path).unwrap().is_empty());
}
