//! Data source traits.

use crate::centiles::{CentileKind, ReferenceCentileTable};
use crate::Dataset;

/// Source of the subject dataset and reference centile tables.
///
/// Implementations own file formats and locations; the dashboard only sees
/// the loaded values.
pub trait DatasetProvider {
    /// Error raised while loading.
    type Error: std::error::Error;

    /// Loads the subject dataset.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn load_dataset(&self) -> Result<Dataset, Self::Error>;

    /// Loads the reference table of one centile kind.
    ///
    /// Returns `Ok(None)` for [`CentileKind::None`] or when the provider has
    /// no table for the kind.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn load_centiles(
        &self,
        kind: CentileKind,
    ) -> Result<Option<ReferenceCentileTable>, Self::Error>;
}
