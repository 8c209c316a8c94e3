use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TilingError;

pub const DEFAULT_MAX_OUTPUT: Dimensions = Dimensions {
    width: 1280,
    height: 720,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

/// Accepts `"WxH"` or a single `"N"` (square). Whitespace around each
/// number is ignored.
impl FromStr for Dimensions {
    type Err = TilingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TilingError::InvalidDimensions(s.to_owned());

        let numbers = s
            .split(['x', 'X'])
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        let dims = match numbers.as_slice() {
            [side] => Dimensions::new(*side, *side),
            [width, height] => Dimensions::new(*width, *height),
            _ => return Err(invalid()),
        };

        if dims.width == 0 || dims.height == 0 {
            return Err(invalid());
        }

        Ok(dims)
    }
}

impl TryFrom<String> for Dimensions {
    type Error = TilingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimensions> for String {
    fn from(value: Dimensions) -> Self {
        format!("{}x{}", value.width, value.height)
    }
}

/// Parse a user-entered size, falling back to `default` when it can't be read.
pub fn interpret_target_dimensions(text: &str, default: Dimensions) -> Dimensions {
    match text.parse() {
        Ok(dims) => dims,
        Err(err) => {
            tracing::warn!("{err}, using {default}");
            default
        }
    }
}

/// Rows and columns needed to fit `num_sources` tiles into `columns` columns.
pub fn grid_for(num_sources: usize, columns: u32) -> (u32, u32) {
    let columns = columns.max(1);
    let rows = (num_sources as u32).div_ceil(columns).max(1);
    (rows, columns)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    pub rows: u32,
    pub columns: u32,
    pub tile: Dimensions,
    pub output: Dimensions,
}

impl TilePlan {
    /// Fit a `rows x columns` grid of the largest source into `max_output`,
    /// keeping that source's aspect ratio.
    pub fn plan(
        sources: &[Dimensions],
        rows: u32,
        columns: u32,
        max_output: Dimensions,
    ) -> Result<Self, TilingError> {
        check_grid(rows, columns)?;

        // first source wins ties
        let largest = sources
            .iter()
            .copied()
            .reduce(|best, dims| if dims.area() > best.area() { dims } else { best })
            .ok_or(TilingError::NoSources)?;

        let scale_x = max_output.width as f64 / (largest.width as f64 * columns as f64);
        let scale_y = max_output.height as f64 / (largest.height as f64 * rows as f64);
        let scale = scale_x.min(scale_y);

        let tile = Dimensions::new(
            fit_side(scale * largest.width as f64, max_output.width, columns),
            fit_side(scale * largest.height as f64, max_output.height, rows),
        );

        tracing::debug!(
            largest = %largest,
            scale_x,
            scale_y,
            tile = %tile,
            "planned tiling"
        );

        Ok(Self::from_tile(tile, rows, columns))
    }

    /// Plan around a requested output size; the output is snapped to a whole
    /// number of equal tiles.
    pub fn from_output(output: Dimensions, rows: u32, columns: u32) -> Result<Self, TilingError> {
        check_grid(rows, columns)?;

        let tile = Dimensions::new(
            ((output.width as f64 / columns as f64).round() as u32).max(1),
            ((output.height as f64 / rows as f64).round() as u32).max(1),
        );

        Ok(Self::from_tile(tile, rows, columns))
    }

    fn from_tile(tile: Dimensions, rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            tile,
            output: Dimensions::new(tile.width * columns, tile.height * rows),
        }
    }

    pub fn cells(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn blank_cells(&self, num_sources: usize) -> usize {
        self.cells().saturating_sub(num_sources)
    }

    /// Top-left pixel of the cell at `index` (row-major).
    pub fn cell_origin(&self, index: usize) -> (u32, u32) {
        let row = index as u32 / self.columns;
        let col = index as u32 % self.columns;
        (col * self.tile.width, row * self.tile.height)
    }
}

fn check_grid(rows: u32, columns: u32) -> Result<(), TilingError> {
    if rows == 0 || columns == 0 {
        return Err(TilingError::EmptyGrid { rows, columns });
    }
    Ok(())
}

fn fit_side(scaled: f64, bound: u32, count: u32) -> u32 {
    let rounded = scaled.round() as u32;
    rounded.min(bound / count).max(1)
}
