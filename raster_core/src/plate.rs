//! Plate and well geometry.
//!
//! Pure functions from `(plate, row, col, sub-plate, offsets)` to well-centre
//! coordinates in millimeters, plus label derivation and parsing.

use serde::{Deserialize, Serialize};

use raster_config::MAX_CUSTOM_GRID;

use crate::error::{RasterError, Result};

/// Fixed grid parameters of the built-in plate layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGrid {
    pub rows: u32,
    pub cols: u32,
    /// Centre-to-centre well spacing in mm.
    pub spacing_mm: f64,
    pub diameter_mm: f64,
}

pub const STANDARD96: FixedGrid = FixedGrid {
    rows: 8,
    cols: 12,
    spacing_mm: 9.0,
    diameter_mm: 2.0,
};

/// One slide of a dual 44-well layout.
pub const SLIDE44: FixedGrid = FixedGrid {
    rows: 4,
    cols: 11,
    spacing_mm: 4.0,
    diameter_mm: 2.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateType {
    #[serde(rename = "96-well")]
    Standard96,
    #[serde(rename = "44-well")]
    Dual44,
    #[serde(rename = "custom")]
    Custom,
}

impl std::fmt::Display for PlateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Standard96 => "96-well",
            Self::Dual44 => "44-well",
            Self::Custom => "custom",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubPlate {
    A,
    B,
}

/// Operator-defined spot grid (mm). Construct through `CustomPlate::validated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPlate {
    pub print_height: f64,
    pub print_width: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub spot_distance_x: f64,
    pub spot_distance_y: f64,
    pub spot_diameter: f64,
    pub num_rows: u32,
    pub num_columns: u32,
}

impl CustomPlate {
    pub fn validated(self) -> Result<Self> {
        let bad = |what: &str| {
            Err(eyre::Report::new(RasterError::Configuration(format!(
                "custom plate {what}"
            ))))
        };
        if self.num_rows == 0 || self.num_columns == 0 {
            return bad("needs at least one row and one column");
        }
        if self.num_rows > MAX_CUSTOM_GRID || self.num_columns > MAX_CUSTOM_GRID {
            return bad(&format!("rows and columns must each be <= {MAX_CUSTOM_GRID}"));
        }
        if !(self.spot_diameter.is_finite() && self.spot_diameter > 0.0) {
            return bad("spot_diameter must be > 0");
        }
        if !(self.offset_x >= 0.0 && self.offset_y >= 0.0) {
            return bad("offsets must be >= 0");
        }
        let positive = [
            self.spot_distance_x,
            self.spot_distance_y,
            self.print_height,
            self.print_width,
        ];
        if positive.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return bad("distances and print size must be > 0");
        }
        Ok(self)
    }
}

/// A point on the plate in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointMm {
    pub x: f64,
    pub y: f64,
}

impl PointMm {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-plate-type translations applied to every well, plus the startup delay.
#[derive(Debug, Clone, PartialEq)]
pub struct Offsets {
    pub standard96: PointMm,
    pub slide_a: PointMm,
    pub slide_b: PointMm,
    pub startup_delay_s: f64,
}

impl Default for Offsets {
    fn default() -> Self {
        Self {
            standard96: PointMm::new(10.0, 1.0),
            slide_a: PointMm::new(46.0, 11.0),
            slide_b: PointMm::new(46.0, 45.0),
            startup_delay_s: 8.0,
        }
    }
}

/// One well. The label is derived from the other fields when the address is
/// created by a `PlateConfig`, so it is always reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WellAddress {
    row: u32,
    col: u32,
    sub_plate: Option<SubPlate>,
    label: String,
}

impl WellAddress {
    pub fn row(&self) -> u32 {
        self.row
    }
    pub fn col(&self) -> u32 {
        self.col
    }
    pub fn sub_plate(&self) -> Option<SubPlate> {
        self.sub_plate
    }
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for WellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlateConfig {
    Standard96,
    Dual44,
    Custom(CustomPlate),
}

fn invalid(msg: String) -> eyre::Report {
    eyre::Report::new(RasterError::InvalidAddress(msg))
}

fn row_letter(row: u32) -> char {
    char::from_u32(u32::from(b'A') + row).unwrap_or('?')
}

impl PlateConfig {
    pub fn plate_type(&self) -> PlateType {
        match self {
            Self::Standard96 => PlateType::Standard96,
            Self::Dual44 => PlateType::Dual44,
            Self::Custom(_) => PlateType::Custom,
        }
    }

    /// `(rows, columns)` of one addressable grid (per slide for `Dual44`).
    pub fn grid(&self) -> (u32, u32) {
        match self {
            Self::Standard96 => (STANDARD96.rows, STANDARD96.cols),
            Self::Dual44 => (SLIDE44.rows, SLIDE44.cols),
            Self::Custom(c) => (c.num_rows, c.num_columns),
        }
    }

    /// Diameter used to scale a raster pattern into a well.
    pub fn well_diameter_mm(&self) -> f64 {
        match self {
            Self::Standard96 => STANDARD96.diameter_mm,
            Self::Dual44 => SLIDE44.diameter_mm,
            Self::Custom(c) => c.spot_diameter,
        }
    }

    pub fn total_wells(&self) -> usize {
        let (rows, cols) = self.grid();
        let per_grid = rows as usize * cols as usize;
        match self {
            Self::Dual44 => per_grid * 2,
            _ => per_grid,
        }
    }

    fn check(&self, row: u32, col: u32, sub_plate: Option<SubPlate>) -> Result<()> {
        let (rows, cols) = self.grid();
        match (self, sub_plate) {
            (Self::Dual44, None) => {
                return Err(invalid(format!("44-well address ({row},{col}) needs slide A or B")));
            }
            (Self::Standard96 | Self::Custom(_), Some(s)) => {
                return Err(invalid(format!(
                    "{} plate has no slide {s:?}",
                    self.plate_type()
                )));
            }
            _ => {}
        }
        if row >= rows || col >= cols {
            return Err(invalid(format!(
                "({row},{col}) outside {rows}x{cols} {} grid",
                self.plate_type()
            )));
        }
        Ok(())
    }

    fn label_for(&self, row: u32, col: u32, sub_plate: Option<SubPlate>) -> String {
        match self {
            Self::Custom(c) => format!(
                "Spot_{}",
                u64::from(row) * u64::from(c.num_columns) + u64::from(col) + 1
            ),
            _ => {
                let row_offset = match sub_plate {
                    Some(SubPlate::B) => SLIDE44.rows,
                    _ => 0,
                };
                format!("{}{:02}", row_letter(row + row_offset), col + 1)
            }
        }
    }

    /// Build a bounds-checked address with its derived label.
    pub fn address(&self, row: u32, col: u32, sub_plate: Option<SubPlate>) -> Result<WellAddress> {
        self.check(row, col, sub_plate)?;
        Ok(WellAddress {
            row,
            col,
            sub_plate,
            label: self.label_for(row, col, sub_plate),
        })
    }

    /// Inverse of label derivation: `"B03"`, `"E1"`, `"Spot_16"`.
    pub fn address_from_label(&self, label: &str) -> Result<WellAddress> {
        let label = label.trim();
        let bad = || invalid(format!("unrecognised label {label:?} for {} plate", self.plate_type()));
        match self {
            Self::Custom(c) => {
                let n: u32 = label
                    .strip_prefix("Spot_")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(bad)?;
                let spots = c.num_rows.checked_mul(c.num_columns).ok_or_else(bad)?;
                if n == 0 || n > spots {
                    return Err(bad());
                }
                let idx = n - 1;
                self.address(idx / c.num_columns, idx % c.num_columns, None)
            }
            _ => {
                let mut chars = label.chars();
                let letter = chars.next().ok_or_else(bad)?.to_ascii_uppercase();
                if !letter.is_ascii_uppercase() {
                    return Err(bad());
                }
                let col: u32 = chars.as_str().parse().map_err(|_| bad())?;
                if col == 0 {
                    return Err(bad());
                }
                let row = u32::from(letter) - u32::from(b'A');
                match self {
                    Self::Dual44 if row >= SLIDE44.rows => {
                        self.address(row - SLIDE44.rows, col - 1, Some(SubPlate::B))
                    }
                    Self::Dual44 => self.address(row, col - 1, Some(SubPlate::A)),
                    _ => self.address(row, col - 1, None),
                }
            }
        }
    }

    /// Every valid address in selection order: row-major, slide A before slide B.
    pub fn slots(&self) -> Vec<WellAddress> {
        let (rows, cols) = self.grid();
        let subs: &[Option<SubPlate>] = match self {
            Self::Dual44 => &[Some(SubPlate::A), Some(SubPlate::B)],
            _ => &[None],
        };
        let mut out = Vec::with_capacity(self.total_wells());
        for &sub in subs {
            for row in 0..rows {
                for col in 0..cols {
                    out.push(WellAddress {
                        row,
                        col,
                        sub_plate: sub,
                        label: self.label_for(row, col, sub),
                    });
                }
            }
        }
        out
    }

    /// Physical centre of `well` in millimeters.
    pub fn well_center_mm(&self, offsets: &Offsets, well: &WellAddress) -> Result<PointMm> {
        self.check(well.row, well.col, well.sub_plate)?;
        let (row, col) = (f64::from(well.row), f64::from(well.col));
        let fixed = |g: &FixedGrid, off: PointMm| PointMm {
            x: (col + 1.0) * g.spacing_mm + g.diameter_mm / 2.0 + off.x,
            y: row * g.spacing_mm + g.diameter_mm / 2.0 + off.y,
        };
        Ok(match self {
            Self::Standard96 => fixed(&STANDARD96, offsets.standard96),
            Self::Dual44 => {
                let off = match well.sub_plate {
                    Some(SubPlate::B) => offsets.slide_b,
                    _ => offsets.slide_a,
                };
                fixed(&SLIDE44, off)
            }
            Self::Custom(c) => PointMm {
                x: col * c.spot_distance_x + c.offset_x,
                y: row * c.spot_distance_y + c.offset_y,
            },
        })
    }
}
