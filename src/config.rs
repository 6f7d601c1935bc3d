use serde::{Deserialize, Serialize};

/// Which mask builder / topology extractor pair runs for a request.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Color-window mask over the whole image, then the skeleton contour closest to the seed.
    #[default]
    ThresholdContour,
    /// Flood growth from the seed, then the longest endpoint-to-endpoint skeleton path.
    RegionGrowthGraph,
}

/// Half-widths of the color windows built around the seed pixel.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorTolerance {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
    pub channel: u8,
}

impl Default for ColorTolerance {
    fn default() -> Self {
        Self {
            hue: 10,
            saturation: 30,
            value: 30,
            channel: 20,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Fidelity {
    Fine,
    Standard,
    Coarse,
}

impl Fidelity {
    pub fn epsilon_fraction(self) -> f64 {
        match self {
            Fidelity::Fine => 0.003,
            Fidelity::Standard => 0.01,
            Fidelity::Coarse => 0.05,
        }
    }
}

pub const DEFAULT_GROWTH_THRESHOLD: f64 = 30.0;
pub const DEFAULT_EPSILON_FRACTION: f64 = 0.003;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    pub strategy: Strategy,
    pub tolerance: ColorTolerance,
    /// Maximum RGB Euclidean distance to the seed color admitted by region growing.
    pub growth_threshold: f64,
    /// Simplification tolerance as a fraction of the traced path's perimeter.
    pub epsilon_fraction: f64,
    /// Margin added around the bounding box by the normalizer.
    pub padding: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            tolerance: ColorTolerance::default(),
            growth_threshold: DEFAULT_GROWTH_THRESHOLD,
            epsilon_fraction: DEFAULT_EPSILON_FRACTION,
            padding: 0,
        }
    }
}

impl ExtractOptions {
    pub fn from_preset(strategy: Strategy, fidelity: Fidelity) -> Self {
        Self {
            strategy,
            epsilon_fraction: fidelity.epsilon_fraction(),
            ..Self::default()
        }
    }

    /// Replaces unusable numeric settings with their defaults.
    pub fn sanitized(mut self) -> Self {
        if !self.growth_threshold.is_finite() || self.growth_threshold < 0.0 {
            log::warn!(
                "growth threshold {} is unusable, falling back to {}",
                self.growth_threshold,
                DEFAULT_GROWTH_THRESHOLD
            );
            self.growth_threshold = DEFAULT_GROWTH_THRESHOLD;
        }
        if !self.epsilon_fraction.is_finite() || self.epsilon_fraction < 0.0 {
            log::warn!(
                "epsilon fraction {} is unusable, falling back to {}",
                self.epsilon_fraction,
                DEFAULT_EPSILON_FRACTION
            );
            self.epsilon_fraction = DEFAULT_EPSILON_FRACTION;
        }
        self
    }
}
