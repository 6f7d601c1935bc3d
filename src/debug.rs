//! Optional visualisation of intermediate pipeline stages.
//!
//! Sinks observe; nothing they do feeds back into extraction.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::geometry::GridPoint;

const SELECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const SEED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const SEED_RADIUS: i32 = 5;

#[derive(Debug, Clone, Copy)]
pub enum DebugFrame<'a> {
    Mask(&'a GrayImage),
    Skeleton(&'a GrayImage),
    Selection {
        mask: &'a GrayImage,
        points: &'a [GridPoint],
        seed: GridPoint,
    },
}

impl DebugFrame<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            DebugFrame::Mask(_) => "mask",
            DebugFrame::Skeleton(_) => "skeleton",
            DebugFrame::Selection { .. } => "selection",
        }
    }
}

pub trait DebugSink {
    fn record(&mut self, frame: DebugFrame<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn record(&mut self, _frame: DebugFrame<'_>) {}
}

/// Renders every frame into an in-memory RGB image.
#[derive(Debug, Default, Clone)]
pub struct OverlaySink {
    pub frames: Vec<(String, RgbImage)>,
}

impl OverlaySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&RgbImage> {
        self.frames
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, image)| image)
    }
}

impl DebugSink for OverlaySink {
    fn record(&mut self, frame: DebugFrame<'_>) {
        let image = match frame {
            DebugFrame::Mask(mask) | DebugFrame::Skeleton(mask) => binary_to_rgb(mask),
            DebugFrame::Selection { mask, points, seed } => {
                let mut canvas = binary_to_rgb(mask);
                draw_polyline(&mut canvas, points);
                draw_filled_circle_mut(&mut canvas, (seed.x, seed.y), SEED_RADIUS, SEED_COLOR);
                canvas
            }
        };
        self.frames.push((frame.label().to_string(), image));
    }
}

fn binary_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Two pixels wide, matching the weight of the selection outline.
fn draw_polyline(canvas: &mut RgbImage, points: &[GridPoint]) {
    if let [only] = points {
        let inside = only.x >= 0
            && only.y >= 0
            && only.x < canvas.width() as i32
            && only.y < canvas.height() as i32;
        if inside {
            canvas.put_pixel(only.x as u32, only.y as u32, SELECTION_COLOR);
        }
        return;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                canvas,
                (a.x as f32 + offset, a.y as f32),
                (b.x as f32 + offset, b.y as f32),
                SELECTION_COLOR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_noop_sink_accepts_frames() {
        let mask = GrayImage::new(4, 4);
        let mut sink = NoopSink;
        sink.record(DebugFrame::Mask(&mask));
    }

    #[test]
    fn test_overlay_draws_selection_and_seed() {
        let mut mask = GrayImage::new(40, 40);
        mask.put_pixel(2, 2, Luma([255]));
        let points = [GridPoint::new(5, 30), GridPoint::new(35, 30)];
        let mut sink = OverlaySink::new();
        sink.record(DebugFrame::Mask(&mask));
        sink.record(DebugFrame::Selection {
            mask: &mask,
            points: &points,
            seed: GridPoint::new(20, 10),
        });

        assert_eq!(sink.frames.len(), 2);
        let mask_frame = sink.get("mask").unwrap();
        assert_eq!(*mask_frame.get_pixel(2, 2), Rgb([255, 255, 255]));
        assert_eq!(*mask_frame.get_pixel(3, 3), Rgb([0, 0, 0]));

        let overlay = sink.get("selection").unwrap();
        assert_eq!(*overlay.get_pixel(20, 30), SELECTION_COLOR);
        assert_eq!(*overlay.get_pixel(20, 10), SEED_COLOR);
        assert_eq!(*overlay.get_pixel(2, 2), Rgb([255, 255, 255]));
        assert!(sink.get("skeleton").is_none());
    }
}
