//! Dataset CSV writer.

use crate::Result;
use csv::WriterBuilder;
use roichart_core::{Column, Dataset};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes datasets as CSV, identifier column first.
///
/// NaN cells are written empty so the output reads back as missing values.
pub struct DatasetWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl DatasetWriter<File> {
    /// Creates a writer for a new file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> DatasetWriter<W> {
    /// Wraps any byte sink.
    pub fn from_writer(sink: W) -> Self {
        Self {
            writer: WriterBuilder::new().from_writer(sink),
        }
    }

    /// Writes the header and all rows, then flushes.
    ///
    /// # Errors
    /// Returns an error on any write failure.
    pub fn write_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        let names: Vec<&str> = dataset.column_names().collect();
        let columns: Vec<&Column> = names
            .iter()
            .filter_map(|name| dataset.column(name))
            .collect();

        let mut header = Vec::with_capacity(names.len() + 1);
        header.push(dataset.id_column());
        header.extend(names.iter().copied());
        self.writer.write_record(&header)?;

        for (row, id) in dataset.ids().iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(id.clone());
            for column in &columns {
                record.push(format_cell(column, row));
            }
            self.writer.write_record(&record)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying sink.
    ///
    /// # Errors
    /// Returns an error if buffered data cannot be flushed.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::Error::Io(e.into_error()))
    }
}

fn format_cell(column: &Column, row: usize) -> String {
    match column {
        Column::Numeric(values) => {
            let value = values[row];
            if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            }
        }
        Column::Categorical(values) => values[row].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetReader;
    use tempfile::NamedTempFile;

    fn sample() -> Dataset {
        Dataset::new("MRID", vec!["S1".into(), "S2".into()])
            .unwrap()
            .with_column("Sex", Column::Categorical(vec!["F".into(), "M".into()]))
            .unwrap()
            .with_column("GM", Column::Numeric(vec![500.5, f64::NAN]))
            .unwrap()
    }

    #[test]
    fn test_write_csv() {
        let mut writer = DatasetWriter::from_writer(Vec::new());
        writer.write_dataset(&sample()).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "MRID,Sex,GM\nS1,F,500.5\nS2,M,\n");
    }

    #[test]
    fn test_written_file_reads_back() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = DatasetWriter::create(file.path()).unwrap();
        writer.write_dataset(&sample()).unwrap();
        drop(writer);

        let ds = DatasetReader::new().read_path(file.path()).unwrap();
        assert_eq!(ds.ids(), &["S1", "S2"]);
        let gm = ds.numeric("GM").unwrap();
        assert!((gm[0] - 500.5).abs() < f64::EPSILON);
        assert!(gm[1].is_nan());
    }
}
