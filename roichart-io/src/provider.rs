//! File-backed data provider.

use crate::{CentileDirectory, DatasetReader, Error};
use roichart_core::{CentileKind, Dataset, DatasetProvider, ReferenceCentileTable};
use std::path::PathBuf;

/// Provider reading the dataset from one CSV file and reference centiles
/// from an optional directory.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    data_path: PathBuf,
    reader: DatasetReader,
    centiles: Option<CentileDirectory>,
}

impl CsvProvider {
    /// Creates a provider for a dataset file.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            reader: DatasetReader::new(),
            centiles: None,
        }
    }

    /// Sets the dataset reader configuration.
    #[must_use]
    pub fn with_reader(mut self, reader: DatasetReader) -> Self {
        self.reader = reader;
        self
    }

    /// Sets the reference centile directory.
    #[must_use]
    pub fn with_centile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.centiles = Some(CentileDirectory::new(dir));
        self
    }
}

impl DatasetProvider for CsvProvider {
    type Error = Error;

    fn load_dataset(&self) -> Result<Dataset, Error> {
        self.reader.read_path(&self.data_path)
    }

    fn load_centiles(&self, kind: CentileKind) -> Result<Option<ReferenceCentileTable>, Error> {
        match &self.centiles {
            Some(dir) => dir.load(kind),
            None => Ok(None),
        }
    }
}
