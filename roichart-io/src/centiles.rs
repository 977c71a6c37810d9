//! Reference centile table files.
//!
//! A table file has an `ROI` column, an `Age` column and one
//! `centile_<level>` column per centile level.

use crate::{Error, Result};
use csv::ReaderBuilder;
use roichart_core::centiles::parse_level_column;
use roichart_core::{CentileKind, ReferenceCentileTable};
use std::io::Read;
use std::path::{Path, PathBuf};

const ROI_COLUMN: &str = "ROI";
const AGE_COLUMN: &str = "Age";

/// Reads a reference centile table from a file.
///
/// # Errors
/// Returns an error if the file cannot be read, a required column is
/// missing, or a row violates the table invariants.
pub fn read_centile_table<P: AsRef<Path>>(path: P) -> Result<ReferenceCentileTable> {
    let path = path.as_ref();
    log::debug!("reading centile table from {}", path.display());
    read_centile_table_from(std::fs::File::open(path)?)
}

/// Reads a reference centile table from any byte source.
///
/// Level columns may appear in any order; they are sorted by level.
///
/// # Errors
/// See [`read_centile_table`].
pub fn read_centile_table_from<R: Read>(source: R) -> Result<ReferenceCentileTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::InvalidFormat(format!("missing {name} column")))
    };
    let roi_index = find(ROI_COLUMN)?;
    let age_index = find(AGE_COLUMN)?;

    let mut level_columns: Vec<(f64, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, name)| parse_level_column(name).map(|level| (level, index)))
        .collect();
    level_columns.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut table =
        ReferenceCentileTable::new(level_columns.iter().map(|(level, _)| *level).collect())?;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let parse = |index: usize| -> Result<f64> {
            let cell = record.get(index).unwrap_or_default();
            cell.parse::<f64>().map_err(|_| {
                Error::InvalidFormat(format!(
                    "data row {}: {cell:?} in column {} is not a number",
                    line + 1,
                    &headers[index]
                ))
            })
        };
        let roi = record.get(roi_index).unwrap_or_default().to_string();
        let age = parse(age_index)?;
        let values = level_columns
            .iter()
            .map(|(_, index)| parse(*index))
            .collect::<Result<Vec<f64>>>()?;
        table.push_row(roi, age, values)?;
    }
    Ok(table)
}

/// Directory holding one reference file per centile kind.
#[derive(Debug, Clone)]
pub struct CentileDirectory {
    root: PathBuf,
}

impl CentileDirectory {
    /// Creates a view of `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of a kind's table.
    #[must_use]
    pub fn path_for(&self, kind: CentileKind) -> Option<PathBuf> {
        kind.file_name().map(|name| self.root.join(name))
    }

    /// Loads a kind's table.
    ///
    /// Returns `Ok(None)` for [`CentileKind::None`] and for kinds whose file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed.
    pub fn load(&self, kind: CentileKind) -> Result<Option<ReferenceCentileTable>> {
        let Some(path) = self.path_for(kind) else {
            return Ok(None);
        };
        if !path.exists() {
            log::warn!("no reference centiles for {kind} at {}", path.display());
            return Ok(None);
        }
        read_centile_table(path).map(Some)
    }

    /// Loads every available kind.
    ///
    /// # Errors
    /// See [`CentileDirectory::load`].
    pub fn load_all(&self) -> Result<Vec<(CentileKind, ReferenceCentileTable)>> {
        let mut out = Vec::new();
        for kind in CentileKind::ALL {
            if let Some(table) = self.load(kind)? {
                out.push((kind, table));
            }
        }
        Ok(out)
    }
}
