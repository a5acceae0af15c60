#![no_main]
use libfuzzer_sys::fuzz_target;
use raster_config::MethodFile;

fuzz_target!(|data: &str| {
    let mut file = MethodFile::parse(data);
    let _ = file.field_f64("FunctionScanTime");
    let _ = file.field_u32("NoOfChannels,");
    file.set("DesiXStep", "0.500000");
    file.set_where(|l| l.starts_with("Dwell(s)_"), "0.2");

    // Rewriting values never adds or drops lines.
    assert_eq!(file.to_string().lines().count(), data.lines().count());
});
