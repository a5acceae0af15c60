use raster_config::MethodMode;
use raster_core::ExpMethodUpdater;
use raster_traits::MethodFileUpdater;
use tempfile::tempdir;

#[test]
fn updater_rewrites_file_in_place() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("desi.exp");
    std::fs::write(
        &path,
        "[FUNCTION 1]\nFunctionScanTime,0.386\nDesiXLength,10\nDesiXStep,0.1\nDesiXRate,100\n",
    )
    .unwrap();

    let mut up = ExpMethodUpdater::default();
    let u = up.update(&path, 1.7).unwrap();
    // 1.7 / 0.4 = 4.25
    assert_eq!(u.scans_per_well, 4);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "[FUNCTION 1]\nFunctionScanTime,0.386\nDesiXLength,5\nDesiXStep,1.250000\nDesiXRate,2500\n"
    );
}

#[test]
fn missing_channel_count_is_method_file_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mrm.exp");
    std::fs::write(&path, "FunctionScanTime(sec),1.0\n").unwrap();

    let mut up = ExpMethodUpdater {
        mode: MethodMode::MultiChannel,
        ..ExpMethodUpdater::default()
    };
    let err = up.update(&path, 1.0).unwrap_err();
    assert!(err.to_string().contains("NoOfChannels"));
    // File is untouched on failure.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "FunctionScanTime(sec),1.0\n"
    );
}

#[test]
fn unreadable_path_is_reported() {
    let dir = tempdir().unwrap();
    let mut up = ExpMethodUpdater::default();
    assert!(up.update(&dir.path().join("missing.exp"), 1.0).is_err());
}
