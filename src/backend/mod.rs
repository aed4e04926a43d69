//! Contract between the mapping engine and a concrete workbook format.
//!
//! Coordinates are 1-based on both axes. A backend reads a whole workbook
//! from a byte stream into an in-memory [`WorkbookSource`] and writes through
//! a [`WorkbookSink`] that serialises everything at the end, so no backend
//! holds an open handle between calls.

pub mod csv;
pub mod memory;

use std::io::{Read, Write};

use crate::error::Result;
use crate::style::CellStyle;
use crate::value::Value;

pub use self::csv::CsvBackend;
pub use self::memory::{MemoryBackend, MemorySheet, MemoryWorkbook};

pub trait SheetSource {
    fn name(&self) -> &str;

    /// Last row holding a non-empty cell, 0 when the sheet is empty.
    fn last_row(&self) -> usize;

    /// Last column holding a non-empty cell in any row, 0 when empty.
    fn last_column(&self) -> usize;

    fn cell_value(&self, row: usize, column: usize) -> Value;

    /// Header text with surrounding whitespace removed, `None` when blank.
    fn header_text(&self, row: usize, column: usize) -> Option<String> {
        let text = self.cell_value(row, column).as_display();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

pub trait WorkbookSource {
    fn sheet_count(&self) -> usize;

    fn sheet_name_at(&self, index: usize) -> Option<&str>;

    fn sheet_at(&self, index: usize) -> Option<&dyn SheetSource>;

    fn sheet_index_by_name(&self, name: &str) -> Option<usize> {
        (0..self.sheet_count()).find(|index| self.sheet_name_at(*index) == Some(name))
    }
}

pub trait SheetSink {
    fn set_header_cell(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        style: Option<&CellStyle>,
    ) -> Result<()>;

    fn set_body_cell(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
        style: Option<&CellStyle>,
    ) -> Result<()>;
}

pub trait WorkbookSink {
    fn create_sheet(&mut self, name: &str) -> Result<&mut dyn SheetSink>;

    fn serialize(&self, writer: &mut dyn Write) -> Result<()>;
}

/// A workbook format: how to load one and how to start writing one.
pub trait SheetBackend: Send + Sync + 'static {
    type Workbook: WorkbookSource;
    type Writer: WorkbookSink;

    fn open(&self, reader: &mut dyn Read) -> Result<Self::Workbook>;

    fn create(&self) -> Self::Writer;
}
