//! CSV writer

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tabforge_core::Dataset;
use tracing::debug;

use crate::error::CsvResult;
use crate::options::{CsvWriteOptions, LineTerminator};

/// CSV file writer
pub struct CsvWriter;

impl CsvWriter {
    /// Write a dataset to a CSV file
    pub fn write_file<P: AsRef<Path>>(
        dataset: &Dataset,
        path: P,
        options: &CsvWriteOptions,
    ) -> CsvResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), rows = dataset.row_count(), "writing csv");
        let file = File::create(path)?;
        Self::write(dataset, file, options)
    }

    /// Write a dataset to a string
    pub fn write_string(dataset: &Dataset, options: &CsvWriteOptions) -> CsvResult<String> {
        let mut buffer = Vec::new();
        Self::write(dataset, &mut buffer, options)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write a dataset to a writer
    ///
    /// Values use their display form; undefined values are empty fields.
    pub fn write<W: Write>(dataset: &Dataset, writer: W, options: &CsvWriteOptions) -> CsvResult<()> {
        let terminator = match options.line_terminator {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        };

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .terminator(terminator)
            .from_writer(writer);

        if dataset.column_count() == 0 {
            return Ok(());
        }

        if options.write_header {
            csv_writer.write_record(dataset.column_names())?;
        }

        for row in dataset.rows() {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvReadOptions, CsvReader};
    use pretty_assertions::assert_eq;
    use tabforge_core::{Column, Value};

    fn sample() -> Dataset {
        Dataset::builder()
            .column("Price", [10.0, 2.5])
            .column("Ratio", [Value::Undefined, Value::from(0.5)])
            .typed_column("Region", Column::texts(["North, East", "South"]))
            .typed_column("Paid", Column::booleans([true, false]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_write_string() {
        let text = CsvWriter::write_string(&sample(), &CsvWriteOptions::default()).unwrap();
        assert_eq!(
            text,
            "Price,Ratio,Region,Paid\n10,,\"North, East\",true\n2.5,0.5,South,false\n"
        );
    }

    #[test]
    fn test_write_without_header_crlf() {
        let options = CsvWriteOptions {
            write_header: false,
            line_terminator: LineTerminator::CRLF,
            ..Default::default()
        };
        let text = CsvWriter::write_string(&sample(), &options).unwrap();
        assert!(text.starts_with("10,,"));
        assert!(text.ends_with("false\r\n"));
    }

    #[test]
    fn test_write_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        CsvWriter::write_file(&sample(), &path, &CsvWriteOptions::default()).unwrap();

        let dataset = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(dataset, sample());
    }
}
