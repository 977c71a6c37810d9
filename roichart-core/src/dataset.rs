//! Column-oriented subject table.
//!
//! Rows are subjects keyed by a unique identifier column; every other column
//! is either a numeric measurement or a categorical grouping variable.

use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Suffix of derived centile columns (`GM_centiles`).
pub const CENTILE_SUFFIX: &str = "_centiles";

/// Name of the centile-augmented column for a variable.
#[must_use]
pub fn centile_column_name(variable: &str) -> String {
    format!("{variable}{CENTILE_SUFFIX}")
}

/// Whether a column name carries the reserved derived-value suffix.
#[must_use]
pub fn is_reserved_column(name: &str) -> bool {
    name.ends_with(CENTILE_SUFFIX)
}

/// A single dataset column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Column {
    /// Numeric measurements; missing cells are NaN.
    Numeric(Vec<f64>),
    /// Categorical labels.
    Categorical(Vec<String>),
}

impl Column {
    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// Returns true if the column has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for numeric columns.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Numeric cells, if this is a numeric column.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Categorical(_) => None,
        }
    }

    /// Group label of a cell.
    ///
    /// Numeric cells are formatted so that integer codes read as `0`, `1`.
    #[must_use]
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(v) => v.get(row).map(|x| format_numeric_label(*x)),
            Column::Categorical(v) => v.get(row).cloned(),
        }
    }
}

fn format_numeric_label(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Subject table with a unique identifier column.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    id_column: String,
    ids: Vec<String>,
    id_lookup: HashMap<String, usize>,
    names: Vec<String>,
    columns: Vec<Column>,
    lookup: HashMap<String, usize>,
}

impl Dataset {
    /// Creates a dataset with only the identifier column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataset`] if an identifier appears twice.
    pub fn new(id_column: impl Into<String>, ids: Vec<String>) -> Result<Self> {
        let mut id_lookup = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if id_lookup.insert(id.clone(), row).is_some() {
                return Err(Error::InvalidDataset(format!(
                    "duplicate subject id: {id}"
                )));
            }
        }
        Ok(Self {
            id_column: id_column.into(),
            ids,
            id_lookup,
            names: Vec::new(),
            columns: Vec::new(),
            lookup: HashMap::new(),
        })
    }

    /// Builder form of [`Dataset::push_column`].
    ///
    /// # Errors
    ///
    /// See [`Dataset::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Appends a new column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataset`] if the name is taken or the column
    /// length differs from the row count.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if name == self.id_column || self.lookup.contains_key(&name) {
            return Err(Error::InvalidDataset(format!("duplicate column: {name}")));
        }
        self.check_len(&name, &column)?;
        self.lookup.insert(name.clone(), self.columns.len());
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Inserts a column, replacing any existing column of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataset`] on a length mismatch or when the
    /// name is the identifier column.
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if name == self.id_column {
            return Err(Error::InvalidDataset(format!(
                "cannot overwrite identifier column {name}"
            )));
        }
        self.check_len(&name, &column)?;
        match self.lookup.get(&name) {
            Some(&idx) => self.columns[idx] = column,
            None => {
                self.lookup.insert(name.clone(), self.columns.len());
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(())
    }

    fn check_len(&self, name: &str, column: &Column) -> Result<()> {
        if column.len() == self.ids.len() {
            Ok(())
        } else {
            Err(Error::InvalidDataset(format!(
                "column {name} has {} rows, expected {}",
                column.len(),
                self.ids.len()
            )))
        }
    }

    /// Number of subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the dataset has no subjects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Name of the identifier column.
    #[must_use]
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Subject identifiers in row order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Identifier of a row.
    #[must_use]
    pub fn id(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(String::as_str)
    }

    /// Row index of a subject.
    #[must_use]
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.id_lookup.get(id).copied()
    }

    /// Returns true if a data column of this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.lookup.get(name).map(|&idx| &self.columns[idx])
    }

    /// Numeric column by name.
    #[must_use]
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_numeric)
    }

    /// All data column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Column names offered in variable pickers (reserved columns excluded).
    #[must_use]
    pub fn selectable_columns(&self) -> Vec<&str> {
        self.column_names()
            .filter(|name| !is_reserved_column(name))
            .collect()
    }

    /// Numeric, non-reserved column names in insertion order.
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(name, col)| col.is_numeric() && !is_reserved_column(name))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Sorted distinct group labels of a column.
    ///
    /// Numeric columns sort by value, categorical columns lexically.
    #[must_use]
    pub fn group_labels(&self, name: &str) -> Option<Vec<String>> {
        match self.column(name)? {
            Column::Numeric(values) => {
                let mut distinct: Vec<f64> =
                    values.iter().copied().filter(|v| !v.is_nan()).collect();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();
                Some(distinct.into_iter().map(format_numeric_label).collect())
            }
            Column::Categorical(values) => {
                let mut distinct = values.clone();
                distinct.sort();
                distinct.dedup();
                Some(distinct)
            }
        }
    }

    /// Regional values divided by ICV and rescaled to the reference mean ICV.
    #[must_use]
    pub fn icv_corrected(
        &self,
        variable: &str,
        icv_column: &str,
        mean_icv: f64,
    ) -> Option<Vec<f64>> {
        let values = self.numeric(variable)?;
        let icv = self.numeric(icv_column)?;
        Some(
            values
                .iter()
                .zip(icv)
                .map(|(v, icv)| v / icv * mean_icv)
                .collect(),
        )
    }

    /// Values of the given numeric columns for one row.
    ///
    /// Columns that are missing or non-numeric are left out.
    #[must_use]
    pub fn row_values<'a, I>(&self, row: usize, names: I) -> BTreeMap<String, f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let value = *self.numeric(name)?.get(row)?;
                Some((name.to_string(), value))
            })
            .collect()
    }
}
