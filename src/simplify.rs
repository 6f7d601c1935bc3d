use imageproc::geometry::arc_length;
use imageproc::point::Point;

use crate::geometry::GridPoint;

pub fn perimeter(points: &[GridPoint], closed: bool) -> f64 {
    let curve: Vec<Point<i32>> = points.iter().copied().map(Point::from).collect();
    arc_length(&curve, closed)
}

/// Douglas–Peucker with a tolerance of `epsilon_fraction` times the curve's perimeter.
pub fn simplify(points: &[GridPoint], epsilon_fraction: f64, closed: bool) -> Vec<GridPoint> {
    let points = dedup_consecutive(points);
    let tolerance = epsilon_fraction * perimeter(&points, closed);
    simplify_with_tolerance(&points, tolerance, closed)
}

/// Douglas–Peucker with an absolute tolerance in pixels.
///
/// The output is a subset of the input in the same order. Open curves keep
/// both endpoints. Closed curves keep the first point and come back explicitly
/// closed (last point equal to the first).
pub fn simplify_with_tolerance(
    points: &[GridPoint],
    tolerance: f64,
    closed: bool,
) -> Vec<GridPoint> {
    let points = dedup_consecutive(points);
    if closed {
        simplify_ring(&points, tolerance)
    } else {
        rdp(&points, tolerance)
    }
}

fn dedup_consecutive(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut out: Vec<GridPoint> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

fn simplify_ring(points: &[GridPoint], tolerance: f64) -> Vec<GridPoint> {
    let mut ring = points.to_vec();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 2 {
        return ring;
    }

    let anchor = ring[0];
    let mut split = 1usize;
    let mut max_dist = 0i64;
    for (i, p) in ring.iter().enumerate().skip(1) {
        let d = p.distance_squared(anchor);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }

    let mut closing = ring[split..].to_vec();
    closing.push(anchor);

    let mut out = rdp(&ring[..=split], tolerance);
    out.pop();
    out.extend(rdp(&closing, tolerance));
    out
}

fn rdp(points: &[GridPoint], epsilon: f64) -> Vec<GridPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];
    let mut max_dist = 0.0;
    let mut index = 0usize;

    for (i, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            index = i;
            max_dist = dist;
        }
    }

    if max_dist > epsilon {
        let mut left = rdp(&points[..=index], epsilon);
        let right = rdp(&points[index..], epsilon);
        left.pop();
        left.into_iter().chain(right).collect()
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: GridPoint, line_start: GridPoint, line_end: GridPoint) -> f64 {
    let dx = (line_end.x - line_start.x) as f64;
    let dy = (line_end.y - line_start.y) as f64;
    if dx == 0.0 && dy == 0.0 {
        return (point.distance_squared(line_start) as f64).sqrt();
    }

    let numerator = (dy * point.x as f64 - dx * point.y as f64
        + line_end.x as f64 * line_start.y as f64
        - line_end.y as f64 * line_start.x as f64)
        .abs();
    let denominator = (dx * dx + dy * dy).sqrt();
    numerator / denominator
}
