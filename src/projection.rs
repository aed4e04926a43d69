//! Backend-agnostic projection between sheet cells and output records.
//!
//! Reading runs in two phases per sheet. Header resolution walks the header
//! row from `first_column_number` to the last populated column and builds a
//! [`MappingTable`] (column position → profile), skipping blank and ignored
//! headers and falling back to an identity profile for unregistered ones. Row
//! projection then walks the data rows below the header, skips rows whose
//! cells are all blank, converts every mapped cell and hands it to a
//! caller-supplied setter.
//!
//! Writing mirrors this: columns are laid out by ascending profile order, the
//! header row is written with the header style, and each record becomes one
//! body row. Large outputs can be split over several sheets with
//! [`plan_pages`].

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use log::{debug, trace};

use crate::backend::{SheetSink, SheetSource};
use crate::error::{Result, SheetError};
use crate::options::{ReadOptions, SheetHandleOptions, WriteOptions};
use crate::profile::ColumnMapProfile;
use crate::value::Value;

pub const DEFAULT_SHEET_BASE: &str = "Sheet";

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    columns: BTreeMap<usize, ColumnMapProfile>,
}

impl MappingTable {
    pub fn get(&self, column: usize) -> Option<&ColumnMapProfile> {
        self.columns.get(&column)
    }

    /// Mapped columns in ascending position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ColumnMapProfile)> {
        self.columns.iter().map(|(column, profile)| (*column, profile))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.values().map(ColumnMapProfile::name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn resolve_read_mapping(sheet: &dyn SheetSource, options: &ReadOptions) -> Result<MappingTable> {
    let header_row = options.header_row_number;
    let mut table = MappingTable::default();
    let mut headers: HashMap<String, usize> = HashMap::new();
    let mut names: HashMap<String, usize> = HashMap::new();

    for column in options.first_column_number..=sheet.last_column() {
        let Some(header) = sheet.header_text(header_row, column) else {
            continue;
        };
        if options.is_ignored(&header) {
            trace!("Ignoring column {column} ('{header}')");
            continue;
        }
        if let Some(previous) = headers.insert(header.clone(), column) {
            return Err(SheetError::DuplicateName(format!(
                "Header '{header}' appears in columns {previous} and {column} of sheet '{}'",
                sheet.name()
            )));
        }
        let profile = options
            .get_map_profile(&header)
            .cloned()
            .unwrap_or_else(|| ColumnMapProfile::identity(&header));
        if profile.is_ignored() {
            continue;
        }
        if let Some(previous) = names.insert(profile.name().to_string(), column) {
            return Err(SheetError::DuplicateName(format!(
                "Columns {previous} and {column} of sheet '{}' both map to '{}'",
                sheet.name(),
                profile.name()
            )));
        }
        table.columns.insert(column, profile);
    }

    debug!(
        "Resolved {} mapped column(s) on sheet '{}'",
        table.len(),
        sheet.name()
    );
    Ok(table)
}

fn row_overflow(header_row: usize) -> SheetError {
    SheetError::InvalidArgument(format!("No data row fits below header row {header_row}"))
}

/// A row is blank when every cell it holds is blank, including cells left of
/// the mapped window.
fn is_blank_row(sheet: &dyn SheetSource, row: usize, last_column: usize) -> bool {
    (1..=last_column).all(|column| sheet.cell_value(row, column).is_blank())
}

/// Projects the data rows below the header into records.
///
/// `new_record` builds an empty record per row and `set_value` stores one
/// converted cell into it. Blank rows are skipped and do not count towards
/// `row_count`.
pub fn project_rows<R, N, S>(
    sheet: &dyn SheetSource,
    options: &ReadOptions,
    table: &MappingTable,
    mut new_record: N,
    mut set_value: S,
) -> Result<Vec<R>>
where
    N: FnMut() -> R,
    S: FnMut(&mut R, &ColumnMapProfile, Value) -> anyhow::Result<()>,
{
    let first_data_row = options
        .header_row_number
        .checked_add(1)
        .ok_or_else(|| row_overflow(options.header_row_number))?;
    let last_row = sheet.last_row();
    let last_column = sheet.last_column();
    let mut records = Vec::new();

    for row in first_data_row..=last_row {
        if options.row_count.is_some_and(|limit| records.len() >= limit) {
            break;
        }
        if is_blank_row(sheet, row, last_column) {
            trace!("Skipping blank row {row}");
            continue;
        }
        let mut record = new_record();
        for (column, profile) in table.iter() {
            let raw = sheet.cell_value(row, column);
            let value = profile
                .convert_cell_value(raw)
                .map_err(|err| SheetError::conversion(profile.name(), row, err))?;
            set_value(&mut record, profile, value)
                .map_err(|err| SheetError::conversion(profile.name(), row, err))?;
        }
        records.push(record);
    }
    Ok(records)
}

/// Lays out the columns for `names` (in declaration order) by ascending
/// profile order; ties keep declaration order.
pub fn resolve_write_mapping<'a, I>(names: I, options: &WriteOptions) -> Result<MappingTable>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut planned = Vec::new();
    let mut columns: HashMap<String, String> = HashMap::new();

    for name in names {
        if options.is_ignored(name) {
            continue;
        }
        let profile = options
            .get_map_profile(name)
            .cloned()
            .unwrap_or_else(|| ColumnMapProfile::identity(name));
        if profile.is_ignored() {
            continue;
        }
        if let Some(previous) =
            columns.insert(profile.column_name().to_string(), profile.name().to_string())
        {
            return Err(SheetError::DuplicateName(format!(
                "'{previous}' and '{}' both write column '{}'",
                profile.name(),
                profile.column_name()
            )));
        }
        planned.push(profile);
    }
    planned.sort_by_key(ColumnMapProfile::order);

    let columns = planned
        .into_iter()
        .enumerate()
        .map(|(offset, profile)| {
            options
                .first_column_number
                .checked_add(offset)
                .map(|column| (column, profile))
                .ok_or_else(|| {
                    SheetError::InvalidArgument(format!(
                        "Column {offset} does not fit after column {}",
                        options.first_column_number
                    ))
                })
        })
        .collect::<Result<_>>()?;
    Ok(MappingTable { columns })
}

/// Writes the header row and one body row per record.
pub fn write_rows<R, G>(
    sheet: &mut dyn SheetSink,
    options: &WriteOptions,
    table: &MappingTable,
    records: &[R],
    mut get_value: G,
) -> Result<()>
where
    G: FnMut(&R, &ColumnMapProfile) -> anyhow::Result<Value>,
{
    let header_row = options.header_row_number;
    header_row
        .checked_add(records.len())
        .ok_or_else(|| row_overflow(header_row))?;
    let header_style = options.header_style.as_ref();
    let body_style = options.body_style.as_ref();

    for (column, profile) in table.iter() {
        sheet.set_header_cell(header_row, column, profile.column_name(), header_style)?;
    }
    for (offset, record) in records.iter().enumerate() {
        let row = header_row + 1 + offset;
        for (column, profile) in table.iter() {
            let value = get_value(record, profile)
                .and_then(|value| profile.convert_item_value(value))
                .map_err(|err| SheetError::conversion(profile.name(), row, err))?;
            sheet.set_body_cell(row, column, value, body_style)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPage {
    pub name: String,
    pub rows: Range<usize>,
}

pub fn sheet_count(total_rows: usize, items_per_sheet: usize) -> usize {
    total_rows.div_ceil(items_per_sheet).max(1)
}

/// Splits `total_rows` over sheets of at most `items_per_sheet` rows named
/// `"{base}{n}"`. Without a page size everything lands on one sheet called
/// `base`. An empty dataset still gets one (header-only) sheet.
pub fn plan_pages(
    base: &str,
    total_rows: usize,
    items_per_sheet: Option<usize>,
) -> Result<Vec<SheetPage>> {
    let base = base.trim();
    let Some(per_sheet) = items_per_sheet else {
        let name = if base.is_empty() {
            format!("{DEFAULT_SHEET_BASE}1")
        } else {
            base.to_string()
        };
        return Ok(vec![SheetPage {
            name,
            rows: 0..total_rows,
        }]);
    };
    if per_sheet == 0 {
        return Err(SheetError::InvalidArgument(
            "items_per_sheet must be at least 1".to_string(),
        ));
    }
    let base = if base.is_empty() { DEFAULT_SHEET_BASE } else { base };
    let count = sheet_count(total_rows, per_sheet);
    debug!("Paginating {total_rows} row(s) over {count} sheet(s)");
    Ok((0..count)
        .map(|number| SheetPage {
            name: format!("{base}{}", number + 1),
            rows: (number * per_sheet).min(total_rows)..((number + 1) * per_sheet).min(total_rows),
        })
        .collect())
}

pub fn read_column_values<V, F>(
    sheet: &dyn SheetSource,
    first_row: usize,
    column: usize,
    mut convert: F,
) -> Result<Vec<V>>
where
    F: FnMut(Value) -> anyhow::Result<V>,
{
    ensure_position(first_row, column)?;
    let label = format!("column {column}");
    (first_row..=sheet.last_row())
        .map(|row| {
            convert(sheet.cell_value(row, column))
                .map_err(|err| SheetError::conversion(&label, row, err))
        })
        .collect()
}

pub fn write_column_values<V, F>(
    sheet: &mut dyn SheetSink,
    first_row: usize,
    column: usize,
    items: &[V],
    mut convert: F,
) -> Result<()>
where
    F: FnMut(&V) -> anyhow::Result<Value>,
{
    ensure_position(first_row, column)?;
    let label = format!("column {column}");
    for (offset, item) in items.iter().enumerate() {
        let row = first_row + offset;
        let value = convert(item).map_err(|err| SheetError::conversion(&label, row, err))?;
        sheet.set_body_cell(row, column, value, None)?;
    }
    Ok(())
}

fn ensure_position(first_row: usize, column: usize) -> Result<()> {
    if first_row < 1 || column < 1 {
        return Err(SheetError::InvalidConfiguration(format!(
            "Row and column numbers start at 1 (got row {first_row}, column {column})"
        )));
    }
    Ok(())
}
