//! Grid addressing: cell identifiers ↔ canvas pixels.
//!
//! The canvas is tiled by a fixed 20×20 grid. Columns are letters `A`–`T`
//! (left to right), rows are numbers `1`–`20` (top to bottom). A cell id may
//! carry a sub-position suffix (`C-5-TL`) that picks one of nine anchors
//! inside the cell.
//!
//! The mapping is deliberately asymmetric: parsing a cell id is partial
//! (malformed or off-grid ids are rejected), while mapping a pixel back to a
//! cell is total (coordinates are clamped onto the grid).

use crate::error::GridError;
use crate::model::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::{Caseless, digit1};
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::one_of;

/// Number of grid columns (`A`..=`T`).
pub const GRID_COLS: u8 = 20;
/// Number of grid rows (`1`..=`20`).
pub const GRID_ROWS: u8 = 20;
/// Inset from the cell edge used by corner and edge-center anchors.
pub const CELL_MARGIN: f64 = 10.0;

// ─── Alignment ──────────────────────────────────────────────────────────

/// One of the nine anchors inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopCenter,
    BottomCenter,
    LeftCenter,
    RightCenter,
}

impl Alignment {
    /// Resolve an alignment name leniently.
    ///
    /// Accepts the long names (`top-left`) and the cell-suffix codes (`TL`),
    /// case-insensitively. Anything unrecognized resolves to `Center`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "top-left" | "tl" => Self::TopLeft,
            "top-right" | "tr" => Self::TopRight,
            "bottom-left" | "bl" => Self::BottomLeft,
            "bottom-right" | "br" => Self::BottomRight,
            "top-center" | "tc" => Self::TopCenter,
            "bottom-center" | "bc" => Self::BottomCenter,
            "left-center" | "lc" => Self::LeftCenter,
            "right-center" | "rc" => Self::RightCenter,
            _ => Self::Center,
        }
    }

    /// Long name, as used in operation arguments.
    pub fn name(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::TopCenter => "top-center",
            Self::BottomCenter => "bottom-center",
            Self::LeftCenter => "left-center",
            Self::RightCenter => "right-center",
        }
    }

    /// Suffix code, as used in cell ids.
    pub fn code(self) -> &'static str {
        match self {
            Self::Center => "C",
            Self::TopLeft => "TL",
            Self::TopRight => "TR",
            Self::BottomLeft => "BL",
            Self::BottomRight => "BR",
            Self::TopCenter => "TC",
            Self::BottomCenter => "BC",
            Self::LeftCenter => "LC",
            Self::RightCenter => "RC",
        }
    }

    /// Offset of this anchor from the cell's top-left corner.
    fn offset(self, cell_w: f64, cell_h: f64) -> (f64, f64) {
        let m = CELL_MARGIN;
        match self {
            Self::Center => (cell_w / 2.0, cell_h / 2.0),
            Self::TopLeft => (m, m),
            Self::TopRight => (cell_w - m, m),
            Self::BottomLeft => (m, cell_h - m),
            Self::BottomRight => (cell_w - m, cell_h - m),
            Self::TopCenter => (cell_w / 2.0, m),
            Self::BottomCenter => (cell_w / 2.0, cell_h - m),
            Self::LeftCenter => (m, cell_h / 2.0),
            Self::RightCenter => (cell_w - m, cell_h / 2.0),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Axis lock ──────────────────────────────────────────────────────────

/// Which axis a grid move keeps frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockAxis {
    /// Keep x, move only vertically.
    Horizontal,
    /// Keep y, move only horizontally.
    Vertical,
}

impl fmt::Display for LockAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// An axis lock together with the coordinate it pins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisLock {
    Horizontal { current_x: f64 },
    Vertical { current_y: f64 },
}

impl AxisLock {
    /// Build a lock for `axis` pinned at the given current position.
    pub fn new(axis: LockAxis, current: Point) -> Self {
        match axis {
            LockAxis::Horizontal => Self::Horizontal {
                current_x: current.x,
            },
            LockAxis::Vertical => Self::Vertical {
                current_y: current.y,
            },
        }
    }

    fn apply(self, p: &mut Point) {
        match self {
            Self::Horizontal { current_x } => p.x = current_x,
            Self::Vertical { current_y } => p.y = current_y,
        }
    }
}

// ─── Grid cell ──────────────────────────────────────────────────────────

/// A validated grid cell, optionally with a sub-position anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    col: u8,
    row: u8,
    sub: Option<Alignment>,
}

impl GridCell {
    /// Build a cell from zero-based column and row indices.
    pub fn new(col: u8, row: u8) -> Result<Self, GridError> {
        if col >= GRID_COLS {
            return Err(GridError::ColumnOutOfRange(column_letter(col)));
        }
        if row >= GRID_ROWS {
            return Err(GridError::RowOutOfRange(u64::from(row) + 1));
        }
        Ok(Self {
            col,
            row,
            sub: None,
        })
    }

    /// Attach a sub-position anchor.
    #[must_use]
    pub fn with_sub(mut self, sub: Alignment) -> Self {
        self.sub = Some(sub);
        self
    }

    /// Zero-based column index.
    pub fn col(&self) -> u8 {
        self.col
    }

    /// Zero-based row index.
    pub fn row(&self) -> u8 {
        self.row
    }

    /// The explicit sub-position, if the id carried one.
    pub fn sub(&self) -> Option<Alignment> {
        self.sub
    }

    /// Same cell without its sub-position.
    #[must_use]
    pub fn base(&self) -> Self {
        Self { sub: None, ..*self }
    }

    /// Column letter (`A`..=`T`).
    pub fn letter(&self) -> char {
        column_letter(self.col)
    }

    /// Center of this cell on `canvas`, ignoring any sub-position.
    pub fn center_pixels(&self, canvas: &GridSpec) -> Point {
        canvas.cell_center(*self)
    }
}

fn column_letter(col: u8) -> char {
    char::from(b'A'.saturating_add(col))
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.letter(), u32::from(self.row) + 1)?;
        if let Some(sub) = self.sub {
            write!(f, "-{}", sub.code())?;
        }
        Ok(())
    }
}

impl FromStr for GridCell {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (letter, digits, sub) = cell_parts
            .parse(s)
            .map_err(|_| GridError::Format(s.to_string()))?;

        let col = letter.to_ascii_uppercase() as u8 - b'A';
        // Digit runs too long for u64 are off the grid by definition.
        let row_number: u64 = digits.parse().unwrap_or(u64::MAX);
        if row_number == 0 || row_number > u64::from(GRID_ROWS) {
            return Err(GridError::RowOutOfRange(row_number));
        }

        let cell = GridCell::new(col, (row_number - 1) as u8)?;
        Ok(match sub {
            Some(sub) => cell.with_sub(sub),
            None => cell,
        })
    }
}

impl Serialize for GridCell {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridCell {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `[A-T]-\d+(-SUB)?`, case-insensitive, whole input.
fn cell_parts<'s>(input: &mut &'s str) -> ModalResult<(char, &'s str, Option<Alignment>)> {
    (
        one_of(('A'..='T', 'a'..='t')),
        preceded('-', digit1),
        opt(preceded('-', sub_position)),
    )
        .parse_next(input)
}

fn sub_position(input: &mut &str) -> ModalResult<Alignment> {
    alt((
        Caseless("TL").value(Alignment::TopLeft),
        Caseless("TR").value(Alignment::TopRight),
        Caseless("TC").value(Alignment::TopCenter),
        Caseless("BL").value(Alignment::BottomLeft),
        Caseless("BR").value(Alignment::BottomRight),
        Caseless("BC").value(Alignment::BottomCenter),
        Caseless("LC").value(Alignment::LeftCenter),
        Caseless("RC").value(Alignment::RightCenter),
        Caseless("C").value(Alignment::Center),
    ))
    .parse_next(input)
}

// ─── Canvas grid ────────────────────────────────────────────────────────

/// Canvas dimensions with the grid laid over them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub width: f64,
    pub height: f64,
}

impl GridSpec {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn cell_width(&self) -> f64 {
        self.width / f64::from(GRID_COLS)
    }

    pub fn cell_height(&self) -> f64 {
        self.height / f64::from(GRID_ROWS)
    }

    /// Pixel position of an anchor inside `cell`.
    ///
    /// The cell's own sub-position wins over `fallback`. The lock, if any,
    /// overrides one coordinate after alignment. Output is rounded.
    pub fn locate(&self, cell: GridCell, fallback: Alignment, lock: Option<AxisLock>) -> Point {
        let (cw, ch) = (self.cell_width(), self.cell_height());
        let (dx, dy) = cell.sub.unwrap_or(fallback).offset(cw, ch);
        let mut p = Point::new(
            f64::from(cell.col) * cw + dx,
            f64::from(cell.row) * ch + dy,
        );
        if let Some(lock) = lock {
            lock.apply(&mut p);
        }
        Point::new(round_half_up(p.x), round_half_up(p.y))
    }

    /// Center of `cell` ignoring any sub-position.
    pub fn cell_center(&self, cell: GridCell) -> Point {
        self.locate(cell.base(), Alignment::Center, None)
    }

    /// The cell containing a pixel. Total: out-of-canvas points clamp onto
    /// the nearest edge cell.
    pub fn cell_at(&self, x: f64, y: f64) -> GridCell {
        let col = clamp_index((x / self.cell_width()).floor(), GRID_COLS);
        let row = clamp_index((y / self.cell_height()).floor(), GRID_ROWS);
        GridCell {
            col,
            row,
            sub: None,
        }
    }
}

fn clamp_index(v: f64, count: u8) -> u8 {
    if v.is_nan() || v < 0.0 {
        0
    } else {
        v.min(f64::from(count - 1)) as u8
    }
}

/// Round to the nearest integer with halves going toward +∞.
///
/// Matches the rounding used by the persisted documents' producers, so
/// `-2.5` becomes `-2`, not `-3`.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

// ─── Free-function surface ──────────────────────────────────────────────

/// Convert a grid cell id to pixel coordinates on a `width`×`height` canvas.
///
/// # Errors
/// [`GridError::Format`] for malformed ids, a range variant for ids whose
/// row or column falls off the 20×20 grid.
pub fn cell_to_pixels(
    grid_id: &str,
    width: f64,
    height: f64,
    fallback: Alignment,
    lock: Option<AxisLock>,
) -> Result<Point, GridError> {
    let cell: GridCell = grid_id.parse()?;
    Ok(GridSpec::new(width, height).locate(cell, fallback, lock))
}

/// Convert pixel coordinates to the containing cell id (`"C-5"`). Never fails.
pub fn pixels_to_cell(x: f64, y: f64, width: f64, height: f64) -> GridCell {
    GridSpec::new(width, height).cell_at(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_plain_and_suffixed() {
        let c: GridCell = "C-5".parse().unwrap();
        assert_eq!((c.col(), c.row(), c.sub()), (2, 4, None));

        let c: GridCell = "t-20-br".parse().unwrap();
        assert_eq!((c.col(), c.row()), (19, 19));
        assert_eq!(c.sub(), Some(Alignment::BottomRight));
        assert_eq!(c.to_string(), "T-20-BR");

        let c: GridCell = "J-10-C".parse().unwrap();
        assert_eq!(c.sub(), Some(Alignment::Center));
    }

    #[test]
    fn parse_rejects_format() {
        for bad in ["", "C5", "C-", "C-5-", "C-5-XX", "C-5-CX", "CC-5", " C-5", "C-5 ", "C--5"] {
            let err = bad.parse::<GridCell>().unwrap_err();
            assert!(matches!(err, GridError::Format(_)), "{bad:?} gave {err:?}");
        }
        // Letters past T never match the pattern.
        assert!(matches!(
            "Z-5".parse::<GridCell>(),
            Err(GridError::Format(_))
        ));
    }

    #[test]
    fn parse_rejects_rows_off_grid() {
        assert_eq!("C-0".parse::<GridCell>(), Err(GridError::RowOutOfRange(0)));
        assert_eq!(
            "C-21".parse::<GridCell>(),
            Err(GridError::RowOutOfRange(21))
        );
        let huge = "C-99999999999999999999999".parse::<GridCell>().unwrap_err();
        assert!(huge.is_range());
    }

    #[test]
    fn new_rejects_column_off_grid() {
        assert_eq!(
            GridCell::new(20, 0),
            Err(GridError::ColumnOutOfRange('U'))
        );
    }

    #[test]
    fn center_of_c5() {
        let p = cell_to_pixels("C-5", 2000.0, 2000.0, Alignment::Center, None).unwrap();
        assert_eq!(p, Point::new(250.0, 450.0));
    }

    #[test]
    fn sub_position_overrides_fallback() {
        let tl = cell_to_pixels("C-5-TL", 2000.0, 2000.0, Alignment::Center, None).unwrap();
        assert_eq!(tl, Point::new(210.0, 410.0));

        let fallback = cell_to_pixels("C-5", 2000.0, 2000.0, Alignment::TopLeft, None).unwrap();
        assert_eq!(fallback, tl);

        let forced_center =
            cell_to_pixels("C-5-C", 2000.0, 2000.0, Alignment::BottomRight, None).unwrap();
        assert_eq!(forced_center, Point::new(250.0, 450.0));
    }

    #[test]
    fn all_nine_anchors() {
        let spec = GridSpec::new(2000.0, 2000.0);
        let cell: GridCell = "A-1".parse().unwrap();
        let at = |a| spec.locate(cell, a, None);
        assert_eq!(at(Alignment::TopRight), Point::new(90.0, 10.0));
        assert_eq!(at(Alignment::BottomLeft), Point::new(10.0, 90.0));
        assert_eq!(at(Alignment::BottomRight), Point::new(90.0, 90.0));
        assert_eq!(at(Alignment::TopCenter), Point::new(50.0, 10.0));
        assert_eq!(at(Alignment::BottomCenter), Point::new(50.0, 90.0));
        assert_eq!(at(Alignment::LeftCenter), Point::new(10.0, 50.0));
        assert_eq!(at(Alignment::RightCenter), Point::new(90.0, 50.0));
    }

    #[test]
    fn unknown_alignment_name_is_center() {
        assert_eq!(Alignment::from_name("diagonal"), Alignment::Center);
        assert_eq!(Alignment::from_name("Top-Left"), Alignment::TopLeft);
        assert_eq!(Alignment::from_name("rc"), Alignment::RightCenter);
    }

    #[test]
    fn axis_lock_pins_one_coordinate() {
        let lock = AxisLock::Horizontal { current_x: 77.0 };
        let p = cell_to_pixels("C-5", 2000.0, 2000.0, Alignment::Center, Some(lock)).unwrap();
        assert_eq!(p, Point::new(77.0, 450.0));

        let lock = AxisLock::new(LockAxis::Vertical, Point::new(5.0, 12.4));
        let p = cell_to_pixels("C-5", 2000.0, 2000.0, Alignment::Center, Some(lock)).unwrap();
        assert_eq!(p, Point::new(250.0, 12.0));
    }

    #[test]
    fn output_rounds_half_up() {
        // 2550 / 20 = 127.5 → center of A-1 is 63.75 → 64.
        let p = cell_to_pixels("A-1", 2550.0, 3300.0, Alignment::Center, None).unwrap();
        assert_eq!(p, Point::new(64.0, 83.0));
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.5), 3.0);
    }

    #[test]
    fn pixels_to_cell_clamps() {
        assert_eq!(pixels_to_cell(250.0, 450.0, 2000.0, 2000.0).to_string(), "C-5");
        assert_eq!(pixels_to_cell(-40.0, -1.0, 2000.0, 2000.0).to_string(), "A-1");
        assert_eq!(
            pixels_to_cell(99_999.0, 2000.0, 2000.0, 2000.0).to_string(),
            "T-20"
        );
        assert_eq!(pixels_to_cell(f64::NAN, 0.0, 2000.0, 2000.0).to_string(), "A-1");
    }

    #[test]
    fn center_round_trip_every_cell() {
        for (w, h) in [(2000.0, 2000.0), (2550.0, 3300.0), (1500.0, 2100.0), (800.0, 600.0)] {
            for col in 0..GRID_COLS {
                for row in 0..GRID_ROWS {
                    let id = GridCell::new(col, row).unwrap().to_string();
                    let p = cell_to_pixels(&id, w, h, Alignment::Center, None).unwrap();
                    assert_eq!(pixels_to_cell(p.x, p.y, w, h).to_string(), id);
                }
            }
        }
    }

    #[test]
    fn pixels_to_cell_stays_on_grid() {
        let spec = GridSpec::new(2550.0, 3300.0);
        let mut x = 0.0;
        while x < spec.width {
            let mut y = 0.0;
            while y < spec.height {
                let c = spec.cell_at(x, y);
                assert!(c.col() < GRID_COLS && c.row() < GRID_ROWS);
                y += 97.3;
            }
            x += 61.7;
        }
    }

    #[test]
    fn grid_cell_serde_as_string() {
        let c: GridCell = serde_json::from_str("\"d-8-tc\"").unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"D-8-TC\"");
        assert!(serde_json::from_str::<GridCell>("\"D-80\"").is_err());
    }
}
