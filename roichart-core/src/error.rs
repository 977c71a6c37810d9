//! Error types for roichart-core.

use thiserror::Error;

/// Result type alias for roichart operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A reference bracket whose two centile values coincide.
///
/// The interpolation slope is undefined for such a bracket, so the ROI is
/// skipped instead of producing an infinite or NaN centile.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "ambiguous centile for {roi}: levels {lower_level} and {upper_level} share reference value {value}"
)]
pub struct AmbiguousCentile {
    /// ROI whose reference row is degenerate.
    pub roi: String,
    /// Lower centile level of the bracket.
    pub lower_level: f64,
    /// Upper centile level of the bracket.
    pub upper_level: f64,
    /// Reference value shared by both levels.
    pub value: f64,
}

/// Core error types for roichart operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Field name that is not a plot configuration attribute.
    #[error("unrecognized plot field: {0}")]
    InvalidField(String),

    /// Field update that cannot be applied to the current configuration.
    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Plot identifier that is not in the registry.
    #[error("unknown plot: {0}")]
    UnknownPlot(String),

    /// Degenerate reference bracket.
    #[error(transparent)]
    AmbiguousCentile(#[from] AmbiguousCentile),

    /// Column that is absent from the dataset.
    #[error("column not found: {0}")]
    MissingColumn(String),

    /// Dataset that violates its structural invariants.
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Reference centile table that violates its structural invariants.
    #[error("invalid centile table: {0}")]
    InvalidCentileTable(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
