use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::geometry::GridPoint;

/// The external contour of a skeleton that passes closest to the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestContour {
    pub points: Vec<GridPoint>,
    /// Euclidean distance from the seed to the closest contour point.
    pub distance: f64,
    /// Number of external contours that competed.
    pub candidates: usize,
}

/// Outer borders that are not nested inside another shape, in scan order.
pub fn external_contours(skeleton: &GrayImage) -> Vec<Vec<GridPoint>> {
    find_contours::<i32>(skeleton)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points.into_iter().map(GridPoint::from).collect())
        .collect()
}

fn min_distance_squared(points: &[GridPoint], seed: GridPoint) -> Option<i64> {
    points.iter().map(|p| p.distance_squared(seed)).min()
}

/// Picks the contour with the smallest point-to-seed distance.
///
/// Equal distances resolve to the contour whose first point comes first in
/// raster order, independent of the order contours were traced in.
pub fn nearest_to_seed(contours: Vec<Vec<GridPoint>>, seed: GridPoint) -> Option<NearestContour> {
    let candidates = contours.len();
    let mut best: Option<(i64, Vec<GridPoint>)> = None;

    for contour in contours {
        let Some(d) = min_distance_squared(&contour, seed) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((best_d, best_points)) => {
                d < *best_d
                    || (d == *best_d && contour[0].raster_key() < best_points[0].raster_key())
            }
        };
        if better {
            best = Some((d, contour));
        }
    }

    best.map(|(d, points)| NearestContour {
        points,
        distance: (d as f64).sqrt(),
        candidates,
    })
}
