use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::color::{check_seed, ColorModel};
use crate::config::{ExtractOptions, Strategy};
use crate::contour::{external_contours, nearest_to_seed};
use crate::debug::{DebugFrame, DebugSink, NoopSink};
use crate::error::ExtractError;
use crate::geometry::{normalize, CanvasSize, GridPoint, NormalizedGeometry};
use crate::graph::SkeletonGraph;
use crate::mask::{count_foreground, grow_region, threshold_mask};
use crate::simplify::simplify;
use crate::skeleton::skeletonize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfStats {
    pub mask_ms: u64,
    pub skeleton_ms: u64,
    pub topology_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveTrace {
    pub strategy: Strategy,
    pub seed: GridPoint,
    /// The polyline forms a ring (contour strategy) rather than an open path.
    pub closed: bool,
    pub mask_pixels: usize,
    pub skeleton_pixels: usize,
    /// Contours or endpoints considered by the topology stage.
    pub candidates: usize,
    /// Point count before simplification.
    pub traced_points: usize,
    pub polyline: Vec<GridPoint>,
    pub geometry: NormalizedGeometry,
    pub perf: PerfStats,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotFoundReason {
    /// The skeleton had no contour at all.
    NoContour,
    /// The skeleton graph had no two connected endpoints.
    NoEndpointPath,
    /// The selected curve reduced to fewer than two points.
    DegenerateGeometry,
}

/// Outcome of a well-formed request. `NotFound` is a normal terminal state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Extraction {
    Found(CurveTrace),
    NotFound { reason: NotFoundReason },
}

impl Extraction {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    pub fn trace(&self) -> Option<&CurveTrace> {
        match self {
            Extraction::Found(trace) => Some(trace),
            Extraction::NotFound { .. } => None,
        }
    }

    fn not_found(reason: NotFoundReason) -> Self {
        log::info!("no curve found: {:?}", reason);
        Extraction::NotFound { reason }
    }
}

/// Extracts the curve passing through `(seed_x, seed_y)`.
///
/// Fails only when the seed lies outside the image; every other outcome,
/// including "nothing found", is an `Extraction`.
pub fn extract(
    image: &RgbImage,
    seed_x: i64,
    seed_y: i64,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    extract_with_sink(image, seed_x, seed_y, options, &mut NoopSink)
}

pub fn extract_with_sink(
    image: &RgbImage,
    seed_x: i64,
    seed_y: i64,
    options: &ExtractOptions,
    sink: &mut dyn DebugSink,
) -> Result<Extraction, ExtractError> {
    let total_start = Instant::now();
    let options = options.clone().sanitized();
    let seed = check_seed(image, seed_x, seed_y)?;
    let (width, height) = image.dimensions();

    log::info!(
        "Extracting curve: {}x{} image, seed ({}, {}), {:?}",
        width,
        height,
        seed.x,
        seed.y,
        options.strategy
    );

    let mask_start = Instant::now();
    let model = ColorModel::sample(image, seed, &options.tolerance)?;
    let mask = match options.strategy {
        Strategy::ThresholdContour => threshold_mask(image, &model),
        Strategy::RegionGrowthGraph => grow_region(image, &model, options.growth_threshold),
    };
    let mask_pixels = count_foreground(&mask);
    let mask_ms = mask_start.elapsed().as_millis() as u64;
    sink.record(DebugFrame::Mask(&mask));
    log::debug!("mask: {} pixels", mask_pixels);

    let skeleton_start = Instant::now();
    let skeleton = skeletonize(&mask);
    let skeleton_pixels = count_foreground(&skeleton);
    let skeleton_ms = skeleton_start.elapsed().as_millis() as u64;
    sink.record(DebugFrame::Skeleton(&skeleton));
    log::debug!("skeleton: {} pixels", skeleton_pixels);

    let topology_start = Instant::now();
    let (traced, closed, candidates) = match options.strategy {
        Strategy::ThresholdContour => {
            let Some(nearest) = nearest_to_seed(external_contours(&skeleton), seed) else {
                return Ok(Extraction::not_found(NotFoundReason::NoContour));
            };
            log::debug!(
                "contour {} px from seed chosen among {}",
                nearest.distance,
                nearest.candidates
            );
            (nearest.points, true, nearest.candidates)
        }
        Strategy::RegionGrowthGraph => {
            let graph = SkeletonGraph::from_skeleton(&skeleton);
            let endpoints = graph.endpoints().len();
            let path = graph.longest_endpoint_path();
            log::debug!(
                "skeleton graph: {} nodes, {} edges, {} endpoints, path of {}",
                graph.node_count(),
                graph.edge_count(),
                endpoints,
                path.len()
            );
            if path.len() <= 1 {
                return Ok(Extraction::not_found(NotFoundReason::NoEndpointPath));
            }
            (path, false, endpoints)
        }
    };
    let topology_ms = topology_start.elapsed().as_millis() as u64;
    sink.record(DebugFrame::Selection {
        mask: &mask,
        points: &traced,
        seed,
    });

    let polyline = simplify(&traced, options.epsilon_fraction, closed);
    if polyline.len() < 2 {
        return Ok(Extraction::not_found(NotFoundReason::DegenerateGeometry));
    }
    log::debug!("simplified {} points to {}", traced.len(), polyline.len());

    let geometry = normalize(&polyline, CanvasSize { width, height }, options.padding);
    let total_ms = total_start.elapsed().as_millis() as u64;

    log::info!(
        "Curve extracted: {} points, bounds {}x{}, {}ms",
        polyline.len(),
        geometry.bounds.width,
        geometry.bounds.height,
        total_ms
    );

    Ok(Extraction::Found(CurveTrace {
        strategy: options.strategy,
        seed,
        closed,
        mask_pixels,
        skeleton_pixels,
        candidates,
        traced_points: traced.len(),
        polyline,
        geometry,
        perf: PerfStats {
            mask_ms,
            skeleton_ms,
            topology_ms,
            total_ms,
        },
    }))
}

/// Decodes an encoded image (PNG, JPEG, ...) and extracts from it.
pub fn extract_from_bytes(
    bytes: &[u8],
    seed_x: i64,
    seed_y: i64,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    let decoded = image::load_from_memory(bytes)?;
    extract(&decoded.to_rgb8(), seed_x, seed_y, options)
}

pub fn extract_from_path(
    path: impl AsRef<Path>,
    seed_x: i64,
    seed_y: i64,
    options: &ExtractOptions,
    sink: &mut dyn DebugSink,
) -> Result<Extraction, ExtractError> {
    let decoded = image::open(path)?;
    extract_with_sink(&decoded.to_rgb8(), seed_x, seed_y, options, sink)
}
