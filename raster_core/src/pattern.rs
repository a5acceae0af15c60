//! Raster patterns: canvas points scaled into a well, then into stage units.

use serde::{Deserialize, Serialize};

use crate::plate::PointMm;

/// Side length of the square drawing canvas.
pub const CANVAS_SIDE: f64 = 200.0;
/// Canvas coordinate of the well centre on both axes.
pub const CANVAS_CENTER: f64 = 100.0;
/// The well circle is drawn inset by this many canvas units in total.
pub const CANVAS_MARGIN: f64 = 20.0;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub const CENTER: Self = Self {
        x: CANVAS_CENTER,
        y: CANVAS_CENTER,
    };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<raster_config::PatternPoint> for CanvasPoint {
    fn from(p: raster_config::PatternPoint) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Ordered scan path inside one well. Empty means a single dwell at the centre.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    points: Vec<CanvasPoint>,
}

impl Pattern {
    pub fn new(points: Vec<CanvasPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CanvasPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points actually visited per well.
    pub fn executed_len(&self) -> usize {
        self.points.len().max(1)
    }

    pub fn push(&mut self, p: CanvasPoint) {
        self.points.push(p);
    }
}

impl FromIterator<CanvasPoint> for Pattern {
    fn from_iter<I: IntoIterator<Item = CanvasPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Map `pattern` onto a well with the default canvas geometry.
pub fn map_pattern_to_well(pattern: &Pattern, center: PointMm, diameter_mm: f64) -> Vec<PointMm> {
    map_pattern_to_well_with(pattern, center, diameter_mm, CANVAS_SIDE, CANVAS_CENTER)
}

/// `x = center.x + (p.x - canvas_center) * diameter / (canvas_side - 20)`, same for y.
pub fn map_pattern_to_well_with(
    pattern: &Pattern,
    center: PointMm,
    diameter_mm: f64,
    canvas_side: f64,
    canvas_center: f64,
) -> Vec<PointMm> {
    if pattern.is_empty() {
        return vec![center];
    }
    let scale = diameter_mm / (canvas_side - CANVAS_MARGIN);
    pattern
        .points
        .iter()
        .map(|p| PointMm {
            x: center.x + (p.x - canvas_center) * scale,
            y: center.y + (p.y - canvas_center) * scale,
        })
        .collect()
}

/// Conversion from plate millimeters to motion-driver units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageUnits {
    pub units_per_mm: f64,
    /// Standoff subtracted from the X units of the approach move.
    pub approach_offset_units: i64,
    /// Driver's first argument is plate Y.
    pub swap_axes: bool,
}

impl Default for StageUnits {
    fn default() -> Self {
        Self {
            units_per_mm: 400.0,
            approach_offset_units: 600,
            swap_axes: true,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_units(mm: f64, units_per_mm: f64) -> i64 {
    (mm * units_per_mm).round() as i64
}

impl StageUnits {
    /// Plate-space `(x, y)` units for `p`, before axis ordering.
    pub fn plate_units(&self, p: PointMm) -> (i64, i64) {
        (to_units(p.x, self.units_per_mm), to_units(p.y, self.units_per_mm))
    }

    /// Driver arguments for an in-well move.
    pub fn to_driver(&self, p: PointMm) -> (i64, i64) {
        self.order(self.plate_units(p))
    }

    /// Driver arguments for the standoff move before a well's first point.
    pub fn approach(&self, first: PointMm) -> (i64, i64) {
        let (x, y) = self.plate_units(first);
        self.order((x - self.approach_offset_units, y))
    }

    /// Apply axis ordering to plate-space units.
    pub fn order(&self, (x, y): (i64, i64)) -> (i64, i64) {
        if self.swap_axes { (y, x) } else { (x, y) }
    }
}
