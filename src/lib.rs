//! Seeded curve extraction: pick a pixel on a drawn line and get back a
//! simplified polyline following that line.
//!
//! The stages run in order: color model, region mask, skeleton, topology
//! (nearest contour or longest endpoint path), simplification, normalization.

pub mod color;
pub mod config;
pub mod contour;
pub mod debug;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod mask;
pub mod pipeline;
pub mod simplify;
pub mod skeleton;
pub mod snap;

pub use config::{ColorTolerance, ExtractOptions, Fidelity, Strategy};
pub use debug::{DebugFrame, DebugSink, NoopSink, OverlaySink};
pub use error::{ExtractError, SnapError};
pub use geometry::{normalize, Bounds, CanvasSize, GridPoint, NormalizedGeometry};
pub use pipeline::{
    extract, extract_from_bytes, extract_from_path, extract_with_sink, CurveTrace, Extraction,
    NotFoundReason, PerfStats,
};
pub use snap::{
    decode_polyline, LatLon, LineSnapper, RouteMatcher, TraceRequest, ValhallaMatcher,
    DEFAULT_VALHALLA_URL,
};
