use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::overlay::{DEFAULT_SATURATION, clamp_saturation};
use crate::view::ScatterPreset;

/// User settings read from a JSON file; every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Sampling rate used for spectrum frequencies. The default of 1 gives
    /// frequencies in cycles per TR; use `1 / TR` for Hz.
    #[serde(default = "ReviewConfig::default_sample_rate")]
    pub sample_rate: f64,
    /// Initial overlay saturation fraction.
    #[serde(default = "ReviewConfig::default_saturation")]
    pub saturation: f64,
    /// Scatter view shown first.
    #[serde(default)]
    pub scatter_preset: ScatterPreset,
    /// Plot the DC bin of the power spectrum.
    #[serde(default)]
    pub show_dc: bool,
    /// Plot power in decibels rather than linear units.
    #[serde(default = "ReviewConfig::default_decibels")]
    pub decibels: bool,
}

impl ReviewConfig {
    fn default_sample_rate() -> f64 {
        1.0
    }
    fn default_saturation() -> f64 {
        DEFAULT_SATURATION
    }
    fn default_decibels() -> bool {
        true
    }

    /// Read the config at `path`, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ReviewConfig>(&contents) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    log::warn!("Invalid config {}: {err}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Cannot read config {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            log::warn!("sample_rate {} is not positive, using 1.0", self.sample_rate);
            self.sample_rate = Self::default_sample_rate();
        }
        self.saturation = clamp_saturation(self.saturation);
        self
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            sample_rate: Self::default_sample_rate(),
            saturation: Self::default_saturation(),
            scatter_preset: ScatterPreset::default(),
            show_dc: false,
            decibels: Self::default_decibels(),
        }
    }
}
