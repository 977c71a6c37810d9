//! Delimited-text dataset reader.
//!

use crate::{Error, Result};
use csv::ReaderBuilder;
use roichart_core::{Column, Dataset};
use std::io::Read;
use std::path::Path;

/// Cell spellings treated as missing numeric values.
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

/// Reads a subject dataset from CSV.
///
/// Numeric columns are detected automatically: a column is numeric when
/// every non-missing cell parses as a number. Missing cells in numeric
/// columns become NaN.
#[derive(Debug, Clone)]
pub struct DatasetReader {
    id_column: String,
    delimiter: u8,
}

impl Default for DatasetReader {
    fn default() -> Self {
        Self {
            id_column: "MRID".to_string(),
            delimiter: b',',
        }
    }
}

impl DatasetReader {
    /// Creates a reader with the default `MRID` identifier column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier column.
    #[must_use]
    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Reads a dataset from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or violates the dataset
    /// contract (missing or duplicate identifiers).
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        log::debug!("reading dataset from {}", path.display());
        let file = std::fs::File::open(path)?;
        self.read(file)
    }

    /// Reads a dataset from any byte source.
    ///
    /// # Errors
    /// See [`DatasetReader::read_path`].
    pub fn read<R: Read>(&self, source: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let id_index = headers
            .iter()
            .position(|h| *h == self.id_column)
            .ok_or_else(|| {
                Error::InvalidFormat(format!("missing identifier column {}", self.id_column))
            })?;

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (column, field) in cells.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let ids = std::mem::take(&mut cells[id_index]);
        if let Some(row) = ids.iter().position(String::is_empty) {
            return Err(Error::InvalidFormat(format!(
                "empty {} at data row {}",
                self.id_column,
                row + 1
            )));
        }

        let mut dataset = Dataset::new(self.id_column.clone(), ids)?;
        for (index, (name, raw)) in headers.into_iter().zip(cells).enumerate() {
            if index == id_index {
                continue;
            }
            dataset.push_column(name, detect_column(raw))?;
        }
        log::debug!(
            "read {} subjects, {} columns",
            dataset.len(),
            dataset.column_names().count()
        );
        Ok(dataset)
    }
}

/// Reads a dataset with the default reader settings and the given id column.
///
/// # Errors
/// See [`DatasetReader::read_path`].
pub fn read_dataset<P: AsRef<Path>>(path: P, id_column: &str) -> Result<Dataset> {
    DatasetReader::new().with_id_column(id_column).read_path(path)
}

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn detect_column(raw: Vec<String>) -> Column {
    let mut any_value = false;
    let mut numeric = Vec::with_capacity(raw.len());
    for cell in &raw {
        if is_missing(cell) {
            numeric.push(f64::NAN);
            continue;
        }
        match cell.parse::<f64>() {
            Ok(value) => {
                any_value = true;
                numeric.push(value);
            }
            Err(_) => return Column::Categorical(raw),
        }
    }
    if any_value {
        Column::Numeric(numeric)
    } else {
        Column::Categorical(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "MRID,Age,Sex,GM,GM_centiles\n\
                          S1,60,F,500,50\n\
                          S2,65,M,520,\n\
                          S3,70,F,NA,40\n";

    #[test]
    fn test_detects_column_types() {
        let ds = DatasetReader::new().read(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.ids(), &["S1", "S2", "S3"]);
        assert!(ds.numeric("Age").is_some());
        assert!(ds.numeric("Sex").is_none());
        let gm = ds.numeric("GM").unwrap();
        assert!(gm[2].is_nan());
        assert!(ds.numeric("GM_centiles").unwrap()[1].is_nan());
    }

    #[test]
    fn test_missing_id_column() {
        let err = DatasetReader::new()
            .with_id_column("SubjectID")
            .read(SAMPLE.as_bytes())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_duplicate_ids() {
        let data = "MRID,Age\nS1,60\nS1,61\n";
        let err = DatasetReader::new().read(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::CoreError(_)));
    }

    #[test]
    fn test_all_missing_column_is_categorical() {
        let data = "MRID,Notes\nS1,\nS2,\n";
        let ds = DatasetReader::new().read(data.as_bytes()).unwrap();
        assert!(!ds.column("Notes").unwrap().is_numeric());
    }

    #[test]
    fn test_read_path_with_delimiter() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "MRID;Age\nS1;60\n").unwrap();
        file.flush().unwrap();

        let ds = DatasetReader::new()
            .with_delimiter(b';')
            .read_path(file.path())
            .unwrap();
        assert_eq!(ds.numeric("Age").unwrap(), &[60.0]);
    }
}
