use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use raster_core::pattern::{CanvasPoint, Pattern, StageUnits, map_pattern_to_well};
use raster_core::plate::{Offsets, PlateConfig};

// Spiral drawn from the centre outwards, like a freehand raster.
fn spiral(n: usize) -> Pattern {
    (0..n)
        .map(|i| {
            let t = i as f64 / 10.0;
            let r = 80.0 * (i as f64 / n as f64);
            CanvasPoint::new(100.0 + r * t.cos(), 100.0 + r * t.sin())
        })
        .collect()
}

fn bench_plate(c: &mut Criterion) {
    let plate = PlateConfig::Standard96;
    let offsets = Offsets::default();
    let stage = StageUnits::default();
    let wells = plate.slots();

    for n in [16usize, 256] {
        let pattern = spiral(n);
        c.bench_function(&format!("map_96_wells_{n}_points"), |b| {
            b.iter_batched(
                || pattern.clone(),
                |p| {
                    let mut acc = 0i64;
                    for w in &wells {
                        let center = plate.well_center_mm(&offsets, w).unwrap_or_default();
                        for pt in map_pattern_to_well(&p, center, plate.well_diameter_mm()) {
                            let (x, y) = stage.to_driver(pt);
                            acc = acc.wrapping_add(x ^ y);
                        }
                    }
                    black_box(acc)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, bench_plate);
criterion_main!(benches);
