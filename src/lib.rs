//! Review core for ICA decomposition results: metrics catalog, selection
//! and navigation, derived views, spectral analysis and export. The egui
//! front-end lives in the `compview` binary.

pub mod analysis;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod selection;
pub mod state;
pub mod view;
