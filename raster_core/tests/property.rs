use proptest::prelude::*;
use raster_core::pattern::{CANVAS_CENTER, CanvasPoint, Pattern, map_pattern_to_well};
use raster_core::plate::{CustomPlate, Offsets, PlateConfig, PointMm, SubPlate};
use raster_core::timing::{pattern_time, total_run_time};

prop_compose! {
    fn custom_plate()(
        rows in 1u32..20,
        cols in 1u32..20,
        dx in 0.5f64..10.0,
        dy in 0.5f64..10.0,
        ox in 0.0f64..50.0,
        oy in 0.0f64..50.0,
        diam in 0.1f64..5.0,
    ) -> PlateConfig {
        PlateConfig::Custom(CustomPlate {
            print_height: 26.0,
            print_width: 76.0,
            offset_x: ox,
            offset_y: oy,
            spot_distance_x: dx,
            spot_distance_y: dy,
            spot_diameter: diam,
            num_rows: rows,
            num_columns: cols,
        })
    }
}

fn any_plate() -> impl Strategy<Value = PlateConfig> {
    prop_oneof![
        Just(PlateConfig::Standard96),
        Just(PlateConfig::Dual44),
        custom_plate(),
    ]
}

fn sub_for(plate: &PlateConfig, b: bool) -> Option<SubPlate> {
    match plate {
        PlateConfig::Dual44 => Some(if b { SubPlate::B } else { SubPlate::A }),
        _ => None,
    }
}

proptest! {
    #[test]
    fn well_center_is_deterministic_and_monotonic(
        plate in any_plate(),
        r in 0u32..20,
        c in 0u32..20,
        b in any::<bool>(),
    ) {
        let (rows, cols) = plate.grid();
        let (r, c) = (r % rows, c % cols);
        let sub = sub_for(&plate, b);
        let offsets = Offsets::default();
        let w = plate.address(r, c, sub).unwrap();
        let p1 = plate.well_center_mm(&offsets, &w).unwrap();
        let p2 = plate.well_center_mm(&offsets, &w).unwrap();
        prop_assert_eq!(p1, p2);

        if r + 1 < rows {
            let below = plate.address(r + 1, c, sub).unwrap();
            let q = plate.well_center_mm(&offsets, &below).unwrap();
            prop_assert!(q.y > p1.y);
            prop_assert!((q.x - p1.x).abs() < 1e-9);
        }
        if c + 1 < cols {
            let right = plate.address(r, c + 1, sub).unwrap();
            let q = plate.well_center_mm(&offsets, &right).unwrap();
            prop_assert!(q.x > p1.x);
            prop_assert!((q.y - p1.y).abs() < 1e-9);
        }
    }

    #[test]
    fn labels_round_trip(plate in any_plate(), idx in 0usize..400) {
        let slots = plate.slots();
        let w = &slots[idx % slots.len()];
        let back = plate.address_from_label(w.label()).unwrap();
        prop_assert_eq!(&back, w);
    }

    #[test]
    fn mapping_preserves_count_and_order(
        pts in prop::collection::vec((0.0f64..200.0, 0.0f64..200.0), 1..50),
        cx in -100.0f64..100.0,
        cy in -100.0f64..100.0,
        diam in 0.1f64..5.0,
    ) {
        let pattern: Pattern = pts.iter().map(|&(x, y)| CanvasPoint::new(x, y)).collect();
        let out = map_pattern_to_well(&pattern, PointMm::new(cx, cy), diam);
        prop_assert_eq!(out.len(), pts.len());
        for w in pts.windows(2).zip(out.windows(2)) {
            let (src, dst) = w;
            // Order preserved: relative direction of consecutive points survives scaling.
            prop_assert_eq!(src[1].0 > src[0].0, dst[1].x > dst[0].x);
        }
    }

    #[test]
    fn canvas_center_maps_to_well_center(cx in -100.0f64..100.0, cy in -100.0f64..100.0, diam in 0.1f64..5.0) {
        let pattern = Pattern::new(vec![CanvasPoint::new(CANVAS_CENTER, CANVAS_CENTER)]);
        let center = PointMm::new(cx, cy);
        prop_assert_eq!(map_pattern_to_well(&pattern, center, diam), vec![center]);
        prop_assert_eq!(map_pattern_to_well(&Pattern::default(), center, diam), vec![center]);
    }

    #[test]
    fn pattern_time_is_linear_in_points(n in 1usize..500, mv in 0.0f64..2.0, dw in 0.0f64..2.0) {
        let step = pattern_time(n + 1, mv, dw) - pattern_time(n, mv, dw);
        prop_assert!((step - (mv + dw)).abs() < 1e-9);
    }

    #[test]
    fn total_time_grows_with_wells(n in 0usize..500, pt in 0.01f64..60.0, setup in 0.0f64..30.0, between in 0.0f64..5.0) {
        prop_assert!(total_run_time(n + 1, pt, setup, between) > total_run_time(n, pt, setup, between));
    }
}
