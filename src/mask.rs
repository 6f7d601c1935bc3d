use image::{GrayImage, Luma, RgbImage};
use rayon::prelude::*;
use std::collections::VecDeque;

use crate::color::{rgb_distance, ColorModel};

/// Value written for curve pixels; everything else stays 0.
pub const FOREGROUND: u8 = 255;

pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

pub fn is_set(mask: &GrayImage, x: i32, y: i32) -> bool {
    if x < 0 || y < 0 || x >= mask.width() as i32 || y >= mask.height() as i32 {
        return false;
    }
    mask.get_pixel(x as u32, y as u32)[0] != 0
}

pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

/// Pointwise classification of every pixel against the seed's color windows.
///
/// Matching pixels anywhere in the image are admitted, connected to the seed or not.
pub fn threshold_mask(image: &RgbImage, model: &ColorModel) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    let row_len = width as usize;
    mask.par_chunks_mut(row_len)
        .zip(image.as_raw().par_chunks(row_len * 3))
        .for_each(|(out_row, rgb_row)| {
            for (out, p) in out_row.iter_mut().zip(rgb_row.chunks_exact(3)) {
                if model.matches([p[0], p[1], p[2]]) {
                    *out = FOREGROUND;
                }
            }
        });

    mask
}

/// 8-connected flood growth from the seed.
///
/// A neighbor is admitted when its RGB distance to the seed color is at most
/// `max_distance`. Each pixel is examined once; the work-list is a queue, so
/// depth never depends on the region size.
pub fn grow_region(image: &RgbImage, model: &ColorModel, max_distance: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);
    let n = (width as usize) * (height as usize);
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();

    let seed = model.seed;
    let seed_idx = seed.y as usize * width as usize + seed.x as usize;
    visited[seed_idx] = true;
    mask.put_pixel(seed.x as u32, seed.y as u32, Luma([FOREGROUND]));
    queue.push_back((seed.x, seed.y));

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in NEIGHBORS_8 {
            let nx = x + dx;
            let ny = y + dy;

            if nx < 0 || nx >= width as i32 || ny < 0 || ny >= height as i32 {
                continue;
            }

            let nidx = ny as usize * width as usize + nx as usize;
            if visited[nidx] {
                continue;
            }
            visited[nidx] = true;

            let candidate = image.get_pixel(nx as u32, ny as u32).0;
            if rgb_distance(candidate, model.seed_rgb) <= max_distance {
                mask.put_pixel(nx as u32, ny as u32, Luma([FOREGROUND]));
                queue.push_back((nx, ny));
            }
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorTolerance;
    use crate::geometry::GridPoint;
    use image::Rgb;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([220, 20, 20]);

    /// Two red bars separated by white columns.
    fn two_bars() -> RgbImage {
        let mut image = RgbImage::from_pixel(20, 10, WHITE);
        for y in 2..8 {
            for x in 2..5 {
                image.put_pixel(x, y, RED);
            }
            for x in 12..15 {
                image.put_pixel(x, y, RED);
            }
        }
        image
    }

    fn model_at(image: &RgbImage, x: i32, y: i32) -> ColorModel {
        ColorModel::sample(image, GridPoint::new(x, y), &ColorTolerance::default()).unwrap()
    }

    #[test]
    fn test_threshold_mask_includes_disconnected_matches() {
        let image = two_bars();
        let mask = threshold_mask(&image, &model_at(&image, 3, 4));
        assert_eq!(count_foreground(&mask), 36);
        assert!(is_set(&mask, 3, 4));
        assert!(is_set(&mask, 13, 4));
        assert!(!is_set(&mask, 8, 4));
    }

    #[test]
    fn test_region_growth_stays_connected() {
        let image = two_bars();
        let mask = grow_region(&image, &model_at(&image, 3, 4), 30.0);
        assert_eq!(count_foreground(&mask), 18);
        assert!(is_set(&mask, 2, 2));
        assert!(!is_set(&mask, 13, 4));
    }

    #[test]
    fn test_region_growth_follows_diagonal_steps() {
        let mut image = RgbImage::from_pixel(8, 8, WHITE);
        for i in 0..8 {
            image.put_pixel(i, i, RED);
        }
        let mask = grow_region(&image, &model_at(&image, 0, 0), 30.0);
        assert_eq!(count_foreground(&mask), 8);
        assert!(is_set(&mask, 7, 7));
    }

    #[test]
    fn test_region_growth_respects_threshold() {
        let mut image = RgbImage::from_pixel(5, 1, WHITE);
        image.put_pixel(0, 0, Rgb([100, 100, 100]));
        image.put_pixel(1, 0, Rgb([110, 110, 110])); // distance ~17.3
        image.put_pixel(2, 0, Rgb([125, 125, 125])); // distance ~43.3 from seed
        image.put_pixel(3, 0, Rgb([100, 100, 100])); // only reachable through (2, 0)
        let mask = grow_region(&image, &model_at(&image, 0, 0), 30.0);
        assert_eq!(count_foreground(&mask), 2);
        assert!(!is_set(&mask, 3, 0));
    }

    #[test]
    fn test_isolated_seed_yields_single_pixel() {
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(4, 4, WHITE);
        let model = model_at(&image, 4, 4);
        assert_eq!(count_foreground(&grow_region(&image, &model, 30.0)), 1);
        assert_eq!(count_foreground(&threshold_mask(&image, &model)), 1);
    }
}
