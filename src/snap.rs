//! Map-matching of traced points against a road network.
//!
//! [`ValhallaMatcher`] talks to a Valhalla server over HTTP; anything else
//! can plug in through [`RouteMatcher`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SnapError;

pub const DEFAULT_VALHALLA_URL: &str = "http://localhost:8002";
pub const DEFAULT_SEARCH_RADIUS: u32 = 100;
pub const SHAPE_PRECISION: u32 = 6;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceOptions {
    pub turn_penalty_factor: u32,
    pub search_radius: u32,
    pub gps_accuracy: f64,
    pub sigma_z: f64,
    pub beta: u32,
    pub max_route_distance_factor: u32,
    pub max_route_time_factor: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsOptions {
    pub units: String,
}

/// Body of a `trace_attributes` call for pedestrian map snapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRequest {
    pub shape: Vec<LatLon>,
    pub costing: String,
    pub shape_match: String,
    pub search_radius: u32,
    pub gps_accuracy: f64,
    #[serde(rename = "break")]
    pub break_type: String,
    pub break_distance: u32,
    pub interpolation_distance: u32,
    pub format: String,
    pub trace_options: TraceOptions,
    pub directions_options: DirectionsOptions,
}

impl TraceRequest {
    pub fn new(points: &[LatLon], search_radius: u32) -> Self {
        Self {
            shape: points.to_vec(),
            costing: "pedestrian".to_string(),
            shape_match: "map_snap".to_string(),
            search_radius,
            gps_accuracy: 10.0,
            break_type: "distance".to_string(),
            break_distance: 100,
            interpolation_distance: 1,
            format: "osrm".to_string(),
            trace_options: TraceOptions {
                turn_penalty_factor: 500,
                search_radius,
                gps_accuracy: 10.0,
                sigma_z: 4.07,
                beta: 3,
                max_route_distance_factor: 3,
                max_route_time_factor: 3,
            },
            directions_options: DirectionsOptions {
                units: "kilometers".to_string(),
            },
        }
    }
}

/// Transport to a map-matching service.
pub trait RouteMatcher {
    fn trace_attributes(&self, body: &TraceRequest) -> Result<serde_json::Value, SnapError>;
}

/// Blocking client for a Valhalla routing server.
#[derive(Debug, Clone)]
pub struct ValhallaMatcher {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ValhallaMatcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SnapError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        log::info!("Route matcher at {}", base_url);
        Self { base_url, client }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/trace_attributes", self.base_url)
    }
}

impl RouteMatcher for ValhallaMatcher {
    fn trace_attributes(&self, body: &TraceRequest) -> Result<serde_json::Value, SnapError> {
        let url = self.endpoint();
        let response = self.client.post(&url).json(body).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapError::Transport(format!("{url} returned {status}")));
        }

        Ok(response.json()?)
    }
}

/// Decodes a Google-style encoded polyline with `precision` decimal digits.
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<LatLon>, SnapError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat = 0i64;
    let mut lon = 0i64;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        lon += next_delta(bytes, &mut index)?;
        points.push(LatLon::new(lat as f64 / factor, lon as f64 / factor));
    }

    Ok(points)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, SnapError> {
    let mut shift = 0u32;
    let mut result = 0i64;
    loop {
        let offset = *index;
        let byte = match bytes.get(offset) {
            Some(&b) if b >= 63 && shift < 60 => b - 63,
            _ => return Err(SnapError::MalformedPolyline { offset }),
        };
        *index += 1;
        result |= i64::from(byte & 0x1f) << shift;
        shift += 5;
        if byte < 0x20 {
            break;
        }
    }
    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

pub struct LineSnapper<M> {
    matcher: M,
    search_radius: u32,
}

impl<M: RouteMatcher> LineSnapper<M> {
    pub fn new(matcher: M) -> Self {
        Self {
            matcher,
            search_radius: DEFAULT_SEARCH_RADIUS,
        }
    }

    pub fn with_search_radius(mut self, search_radius: u32) -> Self {
        self.search_radius = search_radius;
        self
    }

    /// Snaps `points` onto the road network, or hands them back untouched
    /// when the service fails or returns no shape.
    pub fn snap_points(&self, points: &[LatLon]) -> Vec<LatLon> {
        match self.try_snap(points) {
            Ok(matched) => matched,
            Err(err) => {
                log::warn!("Snapping failed, keeping original points: {}", err);
                points.to_vec()
            }
        }
    }

    pub fn try_snap(&self, points: &[LatLon]) -> Result<Vec<LatLon>, SnapError> {
        let body = TraceRequest::new(points, self.search_radius);
        log::info!("Sending {} points to route matcher", points.len());

        let response = self.matcher.trace_attributes(&body)?;
        let shape = response
            .get("shape")
            .and_then(serde_json::Value::as_str)
            .ok_or(SnapError::MissingShape)?;
        let matched = decode_polyline(shape, SHAPE_PRECISION)?;

        log::info!("Matched {} points", matched.len());
        if let (Some(original), Some(snapped)) = (points.first(), matched.first()) {
            log::debug!(
                "first point ({:.6}, {:.6}) -> ({:.6}, {:.6})",
                original.lat,
                original.lon,
                snapped.lat,
                snapped.lon
            );
        }
        Ok(matched)
    }
}
