use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::backend::{SheetBackend, SheetSink, SheetSource, WorkbookSink, WorkbookSource};
use crate::error::{Result, SheetError};
use crate::style::CellStyle;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledCell {
    pub row: usize,
    pub column: usize,
    pub style: CellStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySheet {
    name: String,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    styles: Vec<StyledCell>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            styles: Vec::new(),
        }
    }

    /// Builds a sheet whose first row lands on row 1, column 1.
    pub fn from_rows<I, R, V>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            styles: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: Value) {
        if row == 0 || column == 0 {
            return;
        }
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        let cells = &mut self.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, Value::Empty);
        }
        cells[column - 1] = value;
    }

    pub fn style_at(&self, row: usize, column: usize) -> Option<&CellStyle> {
        self.styles
            .iter()
            .find(|cell| cell.row == row && cell.column == column)
            .map(|cell| &cell.style)
    }

    fn set_style(&mut self, row: usize, column: usize, style: Option<&CellStyle>) {
        let Some(style) = style else {
            return;
        };
        match self
            .styles
            .iter_mut()
            .find(|cell| cell.row == row && cell.column == column)
        {
            Some(existing) => existing.style = style.clone(),
            None => self.styles.push(StyledCell {
                row,
                column,
                style: style.clone(),
            }),
        }
    }
}

impl SheetSource for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|value| *value != Value::Empty))
            .map_or(0, |index| index + 1)
    }

    fn last_column(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(|value| *value != Value::Empty))
            .max()
            .map_or(0, |index| index + 1)
    }

    fn cell_value(&self, row: usize, column: usize) -> Value {
        if row == 0 || column == 0 {
            return Value::Empty;
        }
        self.rows
            .get(row - 1)
            .and_then(|cells| cells.get(column - 1))
            .cloned()
            .unwrap_or_default()
    }
}

impl SheetSink for MemorySheet {
    fn set_header_cell(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        style: Option<&CellStyle>,
    ) -> Result<()> {
        self.set_cell(row, column, Value::String(text.to_string()));
        self.set_style(row, column, style);
        Ok(())
    }

    fn set_body_cell(
        &mut self,
        row: usize,
        column: usize,
        value: Value,
        style: Option<&CellStyle>,
    ) -> Result<()> {
        self.set_cell(row, column, value);
        self.set_style(row, column, style);
        Ok(())
    }
}

/// Workbook held entirely in memory; serialises as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet_name_at(&self, index: usize) -> Option<&str> {
        self.sheets.get(index).map(|sheet| sheet.name.as_str())
    }

    fn sheet_at(&self, index: usize) -> Option<&dyn SheetSource> {
        self.sheets
            .get(index)
            .map(|sheet| sheet as &dyn SheetSource)
    }
}

impl WorkbookSink for MemoryWorkbook {
    fn create_sheet(&mut self, name: &str) -> Result<&mut dyn SheetSink> {
        if self.sheets.iter().any(|sheet| sheet.name == name) {
            return Err(SheetError::InvalidArgument(format!(
                "A sheet named '{name}' already exists"
            )));
        }
        let index = self.sheets.len();
        self.sheets.push(MemorySheet::new(name));
        Ok(&mut self.sheets[index])
    }

    fn serialize(&self, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl SheetBackend for MemoryBackend {
    type Workbook = MemoryWorkbook;
    type Writer = MemoryWorkbook;

    fn open(&self, reader: &mut dyn Read) -> Result<Self::Workbook> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn create(&self) -> Self::Writer {
        MemoryWorkbook::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_ignore_trailing_empty_cells() {
        let mut sheet = MemorySheet::new("Sheet1");
        sheet.set_cell(1, 1, Value::from("a"));
        sheet.set_cell(3, 2, Value::from("b"));
        sheet.set_cell(5, 4, Value::Empty);
        assert_eq!(sheet.last_row(), 3);
        assert_eq!(sheet.last_column(), 2);
        assert_eq!(sheet.cell_value(2, 1), Value::Empty);
        assert_eq!(sheet.cell_value(0, 1), Value::Empty);
    }

    #[test]
    fn header_text_is_trimmed() {
        let sheet = MemorySheet::from_rows("Sheet1", [[" 姓名 ", "  "]]);
        assert_eq!(sheet.header_text(1, 1).as_deref(), Some("姓名"));
        assert_eq!(sheet.header_text(1, 2), None);
    }

    #[test]
    fn duplicate_sheet_names_are_rejected() {
        let mut workbook = MemoryWorkbook::new();
        workbook.create_sheet("Sheet1").unwrap();
        assert!(workbook.create_sheet("Sheet1").is_err());
    }

    #[test]
    fn json_round_trip_keeps_values_and_styles() {
        let mut workbook = MemoryWorkbook::new();
        let style = CellStyle {
            bold: true,
            ..CellStyle::default()
        };
        let sheet = workbook.create_sheet("Data").unwrap();
        sheet.set_header_cell(1, 1, "Age", Some(&style)).unwrap();
        sheet.set_body_cell(2, 1, Value::Integer(30), None).unwrap();

        let restored = MemoryWorkbook::from_json(&workbook.to_json().unwrap()).unwrap();
        let data = restored.sheet("Data").unwrap();
        assert_eq!(data.cell_value(2, 1), Value::Integer(30));
        assert!(data.style_at(1, 1).unwrap().bold);
        assert_eq!(restored.sheet_index_by_name("Data"), Some(0));
    }
}
