use image::{imageops, GenericImage, Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::layout::TilePlan;
use crate::error::TilingError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for imageops::FilterType {
    fn from(value: ResizeFilter) -> Self {
        match value {
            ResizeFilter::Nearest => imageops::FilterType::Nearest,
            ResizeFilter::Triangle => imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => imageops::FilterType::CatmullRom,
            ResizeFilter::Gaussian => imageops::FilterType::Gaussian,
            ResizeFilter::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Line drawn along the inner edges of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divider {
    pub thickness: u32,
    pub color: [u8; 3],
}

impl Default for Divider {
    fn default() -> Self {
        Self {
            thickness: 2,
            color: [255, 255, 255],
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompositeOptions {
    pub filter: ResizeFilter,
    pub divider: Option<Divider>,
}

/// Stack `frames` row-major into one image of `plan.output` size.
///
/// `None` entries and cells past the end of `frames` stay black.
pub fn composite(
    frames: &[Option<RgbImage>],
    plan: &TilePlan,
    options: &CompositeOptions,
) -> Result<RgbImage, TilingError> {
    if frames.len() > plan.cells() {
        return Err(TilingError::TooManyFrames {
            frames: frames.len(),
            rows: plan.rows,
            columns: plan.columns,
        });
    }

    let tile = plan.tile;
    let mut canvas = RgbImage::new(plan.output.width, plan.output.height);

    for (index, frame) in frames.iter().enumerate() {
        let Some(frame) = frame else {
            continue;
        };

        let (x, y) = plan.cell_origin(index);
        if frame.dimensions() == (tile.width, tile.height) {
            canvas.copy_from(frame, x, y)?;
            continue;
        }

        let scaled = imageops::resize(frame, tile.width, tile.height, options.filter.into());
        if scaled.dimensions() != (tile.width, tile.height) {
            return Err(TilingError::TileMismatch {
                width: tile.width,
                height: tile.height,
                actual_width: scaled.width(),
                actual_height: scaled.height(),
            });
        }
        canvas.copy_from(&scaled, x, y)?;
    }

    if let Some(divider) = options.divider {
        draw_dividers(&mut canvas, plan, divider);
    }

    Ok(canvas)
}

fn draw_dividers(canvas: &mut RgbImage, plan: &TilePlan, divider: Divider) {
    if divider.thickness == 0 {
        return;
    }

    let color = Rgb(divider.color);
    let half = divider.thickness / 2;

    for col in 1..plan.columns {
        let x = (col * plan.tile.width).saturating_sub(half);
        let rect = Rect::at(x as i32, 0).of_size(divider.thickness, plan.output.height);
        draw_filled_rect_mut(canvas, rect, color);
    }

    for row in 1..plan.rows {
        let y = (row * plan.tile.height).saturating_sub(half);
        let rect = Rect::at(0, y as i32).of_size(plan.output.width, divider.thickness);
        draw_filled_rect_mut(canvas, rect, color);
    }
}
