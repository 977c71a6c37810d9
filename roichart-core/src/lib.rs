//! roichart-core: Core types for regional brain-volume dashboards.
//!
//! This crate provides the subject dataset model, reference centile tables,
//! the centile interpolator and the axis bounds calculator.
//!

pub mod bounds;
pub mod centiles;
pub mod dataset;
pub mod error;
pub mod interpolate;
pub mod provider;

pub use bounds::{compute_axis_bounds, padded_bounds, AxisBounds};
pub use centiles::{CentileKind, CentileRow, ReferenceCentileTable};
pub use dataset::{centile_column_name, is_reserved_column, Column, Dataset, CENTILE_SUFFIX};
pub use error::{AmbiguousCentile, Error, Result};
pub use interpolate::{
    augment_with_centiles, estimate_subject_centiles, interpolate_centile, CentileAugmentation,
    SubjectCentiles, SubjectMeasurements,
};
pub use provider::DatasetProvider;
