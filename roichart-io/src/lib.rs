//! roichart-io: CSV file I/O for roichart.
//!
//! This crate loads subject datasets and reference centile tables from
//! delimited text files and writes augmented datasets back out.
//!

mod centiles;
mod error;
mod provider;
mod reader;
mod writer;

pub use centiles::{read_centile_table, read_centile_table_from, CentileDirectory};
pub use error::{Error, Result};
pub use provider::CsvProvider;
pub use reader::{read_dataset, DatasetReader};
pub use writer::DatasetWriter;
