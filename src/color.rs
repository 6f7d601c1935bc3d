//! Seed color sampling and the per-pixel "same curve" predicate.
//!
//! HSV follows the 8-bit convention used by common vision toolkits: hue is
//! stored as degrees / 2 in `[0, 179]`, saturation and value in `[0, 255]`.

use image::{Rgb, RgbImage};
use palette::{FromColor, Hsv, Srgb};

use crate::config::ColorTolerance;
use crate::error::ExtractError;
use crate::geometry::GridPoint;

pub const HUE_MAX: u8 = 179;

/// Inclusive per-channel bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorWindow {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorWindow {
    /// Centers a window on `center` with per-channel half-widths, clamped to `[0, max]`.
    pub fn around(center: [u8; 3], half_widths: [u8; 3], max: [u8; 3]) -> Self {
        let mut lower = [0u8; 3];
        let mut upper = [0u8; 3];
        for c in 0..3 {
            lower[c] = center[c].saturating_sub(half_widths[c]);
            upper[c] = center[c].saturating_add(half_widths[c]).min(max[c]);
        }
        Self { lower, upper }
    }

    pub fn contains(&self, value: [u8; 3]) -> bool {
        (0..3).all(|c| value[c] >= self.lower[c] && value[c] <= self.upper[c])
    }
}

pub fn rgb_to_hsv8(rgb: [u8; 3]) -> [u8; 3] {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    let hsv: Hsv = Hsv::from_color(srgb);

    let hue = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % (HUE_MAX as u32 + 1);
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0);
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0);
    [hue as u8, saturation as u8, value as u8]
}

pub fn rgb_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Rejects seeds outside the image before any pixel is read.
pub fn check_seed(image: &RgbImage, x: i64, y: i64) -> Result<GridPoint, ExtractError> {
    let (width, height) = image.dimensions();
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return Err(ExtractError::InvalidSeed {
            x,
            y,
            width,
            height,
        });
    }
    Ok(GridPoint::new(x as i32, y as i32))
}

/// Color evidence sampled at the seed pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorModel {
    pub seed: GridPoint,
    pub seed_rgb: [u8; 3],
    pub seed_hsv: [u8; 3],
    pub hsv_window: ColorWindow,
    pub rgb_window: ColorWindow,
}

impl ColorModel {
    pub fn sample(
        image: &RgbImage,
        seed: GridPoint,
        tolerance: &ColorTolerance,
    ) -> Result<Self, ExtractError> {
        let seed = check_seed(image, seed.x as i64, seed.y as i64)?;
        let Rgb(seed_rgb) = *image.get_pixel(seed.x as u32, seed.y as u32);
        let seed_hsv = rgb_to_hsv8(seed_rgb);

        let hsv_window = ColorWindow::around(
            seed_hsv,
            [tolerance.hue, tolerance.saturation, tolerance.value],
            [HUE_MAX, 255, 255],
        );
        let rgb_window = ColorWindow::around(seed_rgb, [tolerance.channel; 3], [255; 3]);

        log::debug!(
            "seed ({}, {}) rgb={:?} hsv={:?}",
            seed.x,
            seed.y,
            seed_rgb,
            seed_hsv
        );

        Ok(Self {
            seed,
            seed_rgb,
            seed_hsv,
            hsv_window,
            rgb_window,
        })
    }

    /// Either classifier admitting the pixel is enough; the union tolerates antialiasing.
    pub fn matches(&self, rgb: [u8; 3]) -> bool {
        self.rgb_window.contains(rgb) || self.hsv_window.contains(rgb_to_hsv8(rgb))
    }
}
