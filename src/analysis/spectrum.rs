use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Floor used for non-positive power when converting to decibels.
const DB_FLOOR: f64 = -100.0;

/// One-sided power spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerSpectrum {
    /// Bin frequencies, `i * sample_rate / n`.
    pub frequencies: Vec<f64>,
    /// Power per bin, same length as `frequencies`.
    pub power: Vec<f64>,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// `(frequency, power)` pairs without the DC bin, for display.
    pub fn without_dc(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.power.iter().copied())
            .skip(1)
    }
}

/// Compute the one-sided power spectrum of a time series.
///
/// `None` means no series exists and is an error; an empty series is a valid
/// "no data" case and yields an empty spectrum. The series is zero-padded to
/// the next power of two `n`; bins `0..=n/2` are returned with power
/// `|X_i|² / n²`, doubled for every bin strictly between DC and Nyquist.
pub fn compute_power_spectrum(series: Option<&[f64]>, sample_rate: f64) -> Result<PowerSpectrum> {
    let series = series.ok_or(CoreError::EmptySeries)?;
    if series.is_empty() {
        return Ok(PowerSpectrum::default());
    }

    let n = series.len().next_power_of_two();
    let mut buffer: Vec<Complex<f64>> = series
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(n)
        .collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let nyquist = n / 2;
    let norm = (n * n) as f64;
    let (frequencies, power) = buffer[..=nyquist]
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut p = c.norm_sqr() / norm;
            if i > 0 && i < nyquist {
                p *= 2.0;
            }
            (i as f64 * sample_rate / n as f64, p)
        })
        .unzip();

    Ok(PowerSpectrum { frequencies, power })
}

/// Convert power to decibels relative to `reference` (the maximum when `None`).
///
/// Non-positive power floors at -100 dB; a zero reference maps every bin to 0.
pub fn power_to_decibels(power: &[f64], reference: Option<f64>) -> Vec<f64> {
    if power.is_empty() {
        return Vec::new();
    }
    let reference = reference.unwrap_or_else(|| power.iter().copied().fold(f64::MIN, f64::max));
    if reference == 0.0 {
        return vec![0.0; power.len()];
    }
    power
        .iter()
        .map(|&p| if p <= 0.0 { DB_FLOOR } else { 10.0 * (p / reference).log10() })
        .collect()
}
