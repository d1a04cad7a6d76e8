//! Import and export settings

/// How [`CsvReader`](crate::CsvReader) interprets its input
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// First record names the columns; otherwise they are `column_1`, `column_2`, ...
    pub has_header: bool,
    /// Infer number and boolean columns. When off, every column loads as text.
    pub detect_types: bool,
}

impl Default for CsvReadOptions {
    /// Comma separated, double-quoted, header row, types detected
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: true,
            detect_types: true,
        }
    }
}

/// How [`CsvWriter`](crate::CsvWriter) lays out its output
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Emit column names before the data
    pub write_header: bool,
    pub line_terminator: LineTerminator,
}

impl Default for CsvWriteOptions {
    /// Comma separated with a header row and `\n` line endings, so an
    /// export reads back into the same dataset
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            write_header: true,
            line_terminator: LineTerminator::default(),
        }
    }
}

/// Record separator for exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    /// `\n`
    #[default]
    LF,
    /// `\r\n`
    CRLF,
}
