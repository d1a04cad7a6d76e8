//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tabforge_core::{Column, DType, Dataset, Value};
use tracing::debug;

use crate::error::CsvResult;
use crate::options::CsvReadOptions;

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a dataset
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Dataset> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading csv");
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV text into a dataset
    pub fn read_str(text: &str, options: &CsvReadOptions) -> CsvResult<Dataset> {
        Self::read(text.as_bytes(), options)
    }

    /// Read CSV from a reader into a dataset
    ///
    /// Every record must have the same number of fields as the header.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Dataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .from_reader(reader);

        let mut names: Vec<String> = if options.has_header {
            csv_reader.headers()?.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };
        let mut fields: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        let mut row_count = 0;

        // Read records column by column
        for result in csv_reader.records() {
            let record = result?;

            if row_count == 0 && !options.has_header {
                names = (1..=record.len()).map(|i| format!("column_{}", i)).collect();
                fields = vec![Vec::new(); names.len()];
            }

            for (column, field) in fields.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
            row_count += 1;
        }

        let mut dataset = Dataset::new(row_count);
        for (name, fields) in names.into_iter().zip(fields) {
            let column = Self::build_column(fields, options.detect_types)?;
            dataset.insert_column(name, column)?;
        }

        debug!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "csv read"
        );
        Ok(dataset)
    }

    /// Build a typed column from raw fields
    fn build_column(fields: Vec<String>, detect_types: bool) -> CsvResult<Column> {
        let dtype = if detect_types {
            Self::detect_dtype(&fields)
        } else {
            DType::Text
        };

        let values = fields
            .into_iter()
            .map(|field| {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    return Value::Undefined;
                }
                match dtype {
                    DType::Number => parse_number(trimmed).map_or(Value::Undefined, Value::Number),
                    DType::Boolean => Value::Boolean(trimmed.eq_ignore_ascii_case("true")),
                    DType::Text => Value::Text(field),
                }
            })
            .collect();

        Ok(Column::new(dtype, values)?)
    }

    /// Detect the dtype shared by every non-empty field
    ///
    /// A column with no non-empty field is text.
    fn detect_dtype(fields: &[String]) -> DType {
        let mut defined = fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .peekable();

        if defined.peek().is_none() {
            return DType::Text;
        }

        let defined: Vec<&str> = defined.collect();
        if defined.iter().all(|f| parse_number(f).is_some()) {
            DType::Number
        } else if defined
            .iter()
            .all(|f| f.eq_ignore_ascii_case("true") || f.eq_ignore_ascii_case("false"))
        {
            DType::Boolean
        } else {
            DType::Text
        }
    }
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|n| n.is_finite())
}
