use serde::Serialize;

/// Smallest saturation fraction the window accepts.
pub const MIN_SATURATION: f64 = 0.01;
/// Saturation applied to a freshly loaded volume.
pub const DEFAULT_SATURATION: f64 = 0.9;

/// Colour-scale bounds for a signed statistical map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayRange {
    pub positive_max: f64,
    pub negative_min: f64,
}

/// Clamp a saturation fraction into `(0, 1]`.
pub fn clamp_saturation(fraction: f64) -> f64 {
    if fraction.is_nan() || fraction < MIN_SATURATION {
        MIN_SATURATION
    } else {
        fraction.min(1.0)
    }
}

/// Symmetric display bounds at `saturation` of the largest absolute value.
pub fn compute_range(max_abs: f64, saturation: f64) -> OverlayRange {
    let bound = max_abs.abs() * clamp_saturation(saturation);
    OverlayRange {
        positive_max: bound,
        negative_min: -bound,
    }
}

/// Window state of one loaded volume.
///
/// `max_abs` is fixed when the volume arrives; only the saturation moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayWindow {
    max_abs: f64,
    saturation: f64,
}

impl OverlayWindow {
    pub fn new(max_abs: f64) -> Self {
        Self {
            max_abs: max_abs.abs(),
            saturation: DEFAULT_SATURATION,
        }
    }

    /// Scan the voxel values once for their largest magnitude.
    pub fn from_values(values: &[f32]) -> Self {
        let max_abs = values
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f64, |acc, &v| acc.max(f64::from(v).abs()));
        Self::new(max_abs)
    }

    pub fn max_abs(&self) -> f64 {
        self.max_abs
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    pub fn set_saturation(&mut self, fraction: f64) {
        self.saturation = clamp_saturation(fraction);
    }

    pub fn range(&self) -> OverlayRange {
        compute_range(self.max_abs, self.saturation)
    }
}
