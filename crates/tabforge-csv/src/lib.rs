//! # tabforge-csv
//!
//! CSV reader and writer for tabforge datasets.
//!
//! Reading detects a dtype per column; writing emits one header row followed
//! by one record per row, with undefined values as empty fields.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
