use std::fs;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{imageops, ColorType, ImageEncoder, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::plot::chart::ChartArtifact;
use crate::plot::draw;

pub const DEFAULT_DPI: u32 = 200;
/// Margin kept around the content when cropping, in inches
const TIGHT_PAD_IN: f64 = 0.1;

/// One encoding policy shared by every chart file a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePolicy {
    pub dpi: u32,
    /// Crop to the drawn content plus a small pad
    pub tight: bool,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        ImagePolicy {
            dpi: DEFAULT_DPI,
            tight: true,
        }
    }
}

impl ImagePolicy {
    pub fn rasterize(&self, artifact: &ChartArtifact) -> Result<RgbImage> {
        let (width, height, pixels) = draw::rgb_pixels(artifact, self.dpi)?;
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| Error::Render(format!("pixel buffer does not match {width}x{height}")))?;
        if !self.tight {
            return Ok(image);
        }
        let pad = (TIGHT_PAD_IN * self.dpi as f64).round() as u32;
        Ok(crop_to_content(&image, pad))
    }

    pub fn encode_png(&self, artifact: &ChartArtifact) -> Result<Vec<u8>> {
        let image = self.rasterize(artifact)?;
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::Rgb8,
        )?;
        Ok(bytes)
    }

    /// Encode and write one chart, replacing any existing file.
    pub fn save_png(&self, artifact: &ChartArtifact, path: &Path) -> Result<()> {
        let bytes = self.encode_png(artifact)?;
        fs::write(path, &bytes).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote chart");
        Ok(())
    }
}

/// Bounding box `(x, y, w, h)` of every non-white pixel, if any.
pub fn content_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    let white = Rgb([255u8, 255, 255]);
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if *pixel == white {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Crop away blank margins, keeping `pad` pixels where the canvas allows.
pub fn crop_to_content(image: &RgbImage, pad: u32) -> RgbImage {
    let Some((x, y, w, h)) = content_bounds(image) else {
        return image.clone();
    };
    let x0 = x.saturating_sub(pad);
    let y0 = y.saturating_sub(pad);
    let x1 = (x + w + pad).min(image.width());
    let y1 = (y + h + pad).min(image.height());
    imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image()
}
