//! Data layer: component records, ranking and folder ingestion.
//!
//! Architecture:
//! ```text
//!  results folder (*_metrics.tsv, *_mixing.tsv, comp_*.png, *.svg, ...)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  read files → Dataset (one synchronous snapshot)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ MetricsCatalog │  Vec<Component>, derived ranks, original labels
//!   └────────────────┘
//!        │
//!        ▼
//!   selection / view / export
//! ```

pub mod catalog;
pub mod loader;
pub mod mixing;
pub mod model;
