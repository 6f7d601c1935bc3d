use imageproc::point::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Ordering key used wherever a deterministic tie-break is needed: row first, then column.
    pub fn raster_key(self) -> (i32, i32) {
        (self.y, self.x)
    }
}

impl From<Point<i32>> for GridPoint {
    fn from(p: Point<i32>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<GridPoint> for Point<i32> {
    fn from(p: GridPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub width: i32,
    pub height: i32,
}

/// A polyline re-expressed relative to its own bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGeometry {
    pub canvas: CanvasSize,
    pub bounds: Bounds,
    pub padding: u32,
    pub origin: GridPoint,
    pub extent: CanvasSize,
    pub raw: Vec<GridPoint>,
    pub normalized: Vec<GridPoint>,
}

impl NormalizedGeometry {
    /// Maps the normalized points back into source coordinates.
    pub fn denormalize(&self) -> Vec<GridPoint> {
        self.normalized
            .iter()
            .map(|p| GridPoint::new(p.x + self.origin.x, p.y + self.origin.y))
            .collect()
    }
}

pub fn bounds_for_points(points: &[GridPoint]) -> Bounds {
    if points.is_empty() {
        return Bounds::default();
    }

    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Bounds {
        min_x,
        min_y,
        max_x,
        max_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Largest margin `normalize` applies; larger requests are clamped to it.
pub const MAX_PADDING: u32 = 1 << 20;

/// Translates `points` so the bounding box starts at `padding` on both axes.
///
/// `canvas` is the size of the source image and is carried through untouched
/// so renderers can choose between the tight `extent` and the original frame.
pub fn normalize(points: &[GridPoint], canvas: CanvasSize, padding: u32) -> NormalizedGeometry {
    if padding > MAX_PADDING {
        log::warn!("padding {} clamped to {}", padding, MAX_PADDING);
    }
    let padding = padding.min(MAX_PADDING);
    let bounds = bounds_for_points(points);
    let pad = padding as i32;
    let origin = GridPoint::new(
        bounds.min_x.saturating_sub(pad),
        bounds.min_y.saturating_sub(pad),
    );

    let normalized = points
        .iter()
        .map(|p| GridPoint::new(p.x.saturating_sub(origin.x), p.y.saturating_sub(origin.y)))
        .collect();

    let extent = if points.is_empty() {
        CanvasSize {
            width: 0,
            height: 0,
        }
    } else {
        CanvasSize {
            width: (bounds.width as u32).saturating_add(2 * padding),
            height: (bounds.height as u32).saturating_add(2 * padding),
        }
    };

    NormalizedGeometry {
        canvas,
        bounds,
        padding,
        origin,
        extent,
        raw: points.to_vec(),
        normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CanvasSize {
        CanvasSize {
            width: 100,
            height: 80,
        }
    }

    #[test]
    fn test_bounds_cover_all_points() {
        let points = [
            GridPoint::new(12, 40),
            GridPoint::new(30, 5),
            GridPoint::new(7, 22),
        ];
        let bounds = bounds_for_points(&points);
        assert_eq!(bounds.min_x, 7);
        assert_eq!(bounds.min_y, 5);
        assert_eq!(bounds.max_x, 30);
        assert_eq!(bounds.max_y, 40);
        assert_eq!(bounds.width, 23);
        assert_eq!(bounds.height, 35);
    }

    #[test]
    fn test_normalize_moves_bbox_to_zero() {
        let points = [GridPoint::new(10, 20), GridPoint::new(15, 28)];
        let geometry = normalize(&points, canvas(), 0);
        assert_eq!(geometry.origin, GridPoint::new(10, 20));
        assert_eq!(
            geometry.normalized,
            vec![GridPoint::new(0, 0), GridPoint::new(5, 8)]
        );
        assert_eq!(geometry.extent.width, 5);
        assert_eq!(geometry.extent.height, 8);
        assert_eq!(geometry.canvas, canvas());
    }

    #[test]
    fn test_padding_offsets_origin() {
        let points = [GridPoint::new(10, 20), GridPoint::new(15, 28)];
        let geometry = normalize(&points, canvas(), 4);
        assert_eq!(geometry.normalized[0], GridPoint::new(4, 4));
        assert_eq!(geometry.extent.width, 13);
        assert_eq!(geometry.extent.height, 16);
    }

    #[test]
    fn test_denormalize_restores_raw_points() {
        let points = vec![
            GridPoint::new(33, 71),
            GridPoint::new(-2, 9),
            GridPoint::new(54, 54),
            GridPoint::new(0, 0),
        ];
        for padding in [0, 3, 17] {
            let geometry = normalize(&points, canvas(), padding);
            assert_eq!(geometry.denormalize(), points);
            assert_eq!(geometry.raw, points);
        }
    }

    #[test]
    fn test_oversized_padding_is_clamped() {
        let points = [GridPoint::new(10, 20), GridPoint::new(15, 28)];
        let geometry = normalize(&points, canvas(), u32::MAX);
        assert_eq!(geometry.padding, MAX_PADDING);
        let pad = MAX_PADDING as i32;
        assert_eq!(geometry.normalized[0], GridPoint::new(pad, pad));
        assert_eq!(geometry.extent.width, 5 + 2 * MAX_PADDING);
        assert_eq!(geometry.denormalize(), points);
    }

    #[test]
    fn test_empty_input_has_zero_bounds() {
        let geometry = normalize(&[], canvas(), 2);
        assert_eq!(geometry.bounds, Bounds::default());
        assert!(geometry.normalized.is_empty());
        assert_eq!(geometry.extent.width, 0);
    }
}
