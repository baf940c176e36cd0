//! egui rendering. Every function reads [`compview::state::ReviewState`] and
//! routes user actions back through its methods.

pub mod panels;
pub mod plot;
