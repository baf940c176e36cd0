//! Derived signal views: power spectrum of a component time series and the
//! colour window of the statistical-map overlay.

pub mod overlay;
pub mod spectrum;
