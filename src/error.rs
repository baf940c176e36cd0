use thiserror::Error;

/// Result type for the review core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by catalog, selection, analysis and export operations.
///
/// All of them are local and recoverable: a failed operation leaves the
/// catalog and selection exactly as they were.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Missing or unparsable field in the metrics table.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Operation referenced a component id that is not in the catalog.
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// Classification label outside the closed set.
    #[error("Invalid classification label: {0}")]
    InvalidLabel(String),

    /// Spectral analysis was asked for a series that does not exist.
    #[error("No time series available")]
    EmptySeries,

    /// Classification requested while nothing is selected.
    #[error("No component selected")]
    NoSelection,

    /// Writing an export artifact failed.
    #[error("Export error: {0}")]
    Export(String),
}
