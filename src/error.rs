/// Fatal conditions of an extraction request.
///
/// "No curve found" is not an error; see [`crate::pipeline::Extraction`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("seed ({x}, {y}) is outside the {width}x{height} image")]
    InvalidSeed {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("failed to decode image: {0}")]
    UnreadableImage(#[from] image::ImageError),
}

/// Failures of the route-snapping collaborator. Never surfaced past
/// [`crate::snap::LineSnapper::snap_points`], which falls back to the input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapError {
    #[error("route service request failed: {0}")]
    Transport(String),

    #[error("route service response has no shape")]
    MissingShape,

    #[error("encoded polyline is malformed at byte {offset}")]
    MalformedPolyline { offset: usize },
}

impl From<reqwest::Error> for SnapError {
    fn from(err: reqwest::Error) -> Self {
        SnapError::Transport(err.to_string())
    }
}
