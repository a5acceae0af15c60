#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<raster_config::Config>(data) {
        let _ = cfg.validate();
        // Overlaying its own settings must not panic either.
        let mut cfg = cfg;
        raster_config::Settings::from_config(&cfg).apply_to(&mut cfg);
    }
});
