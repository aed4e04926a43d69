use std::io::{Read, Write};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::backend::memory::{MemorySheet, MemoryWorkbook};
use crate::backend::{SheetBackend, SheetSink, SheetSource, WorkbookSink, WorkbookSource};
use crate::error::{Result, SheetError};
use crate::io_utils::{
    DEFAULT_CSV_DELIMITER, decoding_reader, encode_text, open_csv_reader, open_csv_writer,
    resolve_delimiter, resolve_encoding,
};
use crate::value::Value;

/// Delimited text as a single-sheet workbook. Cells read back as text;
/// record fields coerce them on assignment.
#[derive(Debug, Clone)]
pub struct CsvBackend {
    delimiter: u8,
    encoding: &'static Encoding,
    sheet_name: String,
}

impl Default for CsvBackend {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_CSV_DELIMITER,
            encoding: UTF_8,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl CsvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the delimiter from the file extension.
    pub fn for_path(path: &Path) -> Self {
        Self::default().with_delimiter(resolve_delimiter(path, None))
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Resolves a WHATWG encoding label such as `gbk` or `latin1`.
    pub fn with_encoding_label(self, label: &str) -> Result<Self> {
        Ok(self.with_encoding(resolve_encoding(Some(label))?))
    }

    /// Name reported for the single sheet a stream holds.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}

impl SheetBackend for CsvBackend {
    type Workbook = MemoryWorkbook;
    type Writer = CsvWriter;

    fn open(&self, reader: &mut dyn Read) -> Result<Self::Workbook> {
        let mut csv_reader = open_csv_reader(decoding_reader(reader, self.encoding), self.delimiter);
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Value::Empty
                        } else {
                            Value::String(field.to_string())
                        }
                    })
                    .collect::<Vec<_>>(),
            );
        }
        debug!("Loaded {} CSV record(s) as '{}'", rows.len(), self.sheet_name);
        Ok(MemoryWorkbook::new().with_sheet(MemorySheet::from_rows(self.sheet_name.clone(), rows)))
    }

    fn create(&self) -> Self::Writer {
        CsvWriter {
            workbook: MemoryWorkbook::new(),
            delimiter: self.delimiter,
            encoding: self.encoding,
        }
    }
}

#[derive(Debug)]
pub struct CsvWriter {
    workbook: MemoryWorkbook,
    delimiter: u8,
    encoding: &'static Encoding,
}

impl WorkbookSink for CsvWriter {
    fn create_sheet(&mut self, name: &str) -> Result<&mut dyn SheetSink> {
        if self.workbook.sheet_count() > 0 {
            return Err(SheetError::InvalidArgument(format!(
                "A CSV stream holds a single sheet; cannot add '{name}'"
            )));
        }
        self.workbook.create_sheet(name)
    }

    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = open_csv_writer(Vec::new(), self.delimiter);
        if let Some(sheet) = self.workbook.sheets().first() {
            let last_column = sheet.last_column();
            for row in 1..=sheet.last_row() {
                let record = (1..=last_column)
                    .map(|column| sheet.cell_value(row, column).as_display())
                    .collect::<Vec<_>>();
                csv_writer.write_record(&record)?;
            }
        }
        let bytes = csv_writer
            .into_inner()
            .map_err(|err| SheetError::Io(err.into_error()))?;
        let text = String::from_utf8(bytes)
            .map_err(|err| SheetError::InvalidArgument(format!("CSV output is not UTF-8: {err}")))?;
        writer.write_all(&encode_text(&text, self.encoding)?)?;
        Ok(())
    }
}
