//! Display rendering: physical samples to 8-bit grayscale.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::debug;
use ndarray::{s, Array2, ArrayView2};

use crate::config::RenderConfig;
use crate::error::{Error, Result};

/// Row-major 8-bit grayscale image, `rows * cols` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<u8>,
}

impl RenderedImage {
    /// Display value at `(row, col)`, row 0 being the top of the display.
    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.pixels.get(row * self.cols + col).copied()
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let too_large = |n: usize| Error::InvalidConfig(format!("image dimension {n} exceeds u32"));
        let width = u32::try_from(self.cols).map_err(|_| too_large(self.cols))?;
        let height = u32::try_from(self.rows).map_err(|_| too_large(self.rows))?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            &self.pixels,
            width,
            height,
            ExtendedColorType::L8,
        )?;
        Ok(png)
    }
}

/// Replace NaN and infinities with 0.0.
pub fn sanitize_samples(pixels: ArrayView2<f64>) -> Array2<f64> {
    pixels.mapv(|v| if v.is_finite() { v } else { 0.0 })
}

fn min_max(samples: &Array2<f64>) -> (f64, f64) {
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

fn quantize(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Map samples to display bytes using `config`.
///
/// Non-finite samples render as if they were 0.0. Fails with
/// [`Error::FlatImage`] if every sample is equal and with
/// [`Error::InvalidConfig`] on an out-of-range contrast.
pub fn render(pixels: ArrayView2<f64>, config: &RenderConfig) -> Result<RenderedImage> {
    config.validate()?;
    let (rows, cols) = pixels.dim();
    let samples = sanitize_samples(pixels);

    let (min, max) = min_max(&samples);
    let range = max - min;
    if samples.is_empty() || range == 0.0 {
        return Err(Error::FlatImage {
            value: if samples.is_empty() { 0.0 } else { min },
        });
    }
    debug!(
        "rendering {rows}x{cols} image, range [{min}, {max}], stretch {}",
        config.stretch
    );

    // Halve everything when the span itself overflows f64.
    let k = if range.is_finite() { 1.0 } else { 0.5 };
    let (lo, span) = (min * k, max * k - min * k);

    let display = samples.mapv(|v| {
        let t = ((v * k - lo) / span).clamp(0.0, 1.0);
        let f = config.stretch.apply(t, config.log_contrast).clamp(0.0, 1.0);
        quantize(f)
    });

    let oriented = if config.flip_rows {
        display.slice(s![..;-1, ..]).to_owned()
    } else {
        display
    };

    Ok(RenderedImage {
        rows,
        cols,
        pixels: oriented.iter().copied().collect(),
    })
}
