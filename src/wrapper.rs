//! Asynchronous read and write operations over a workbook backend.
//!
//! Every operation validates its options and sheet selector on the calling
//! task, then runs as a single unit on a blocking worker. Cancellation is
//! checked before the unit is scheduled; once running, the unit completes on
//! its own and a cancelled caller merely stops waiting for it. Inputs are
//! opened inside the unit and released when it returns, on success or error.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::backend::{SheetBackend, SheetSource, WorkbookSink, WorkbookSource};
use crate::error::{Result, SheetError};
use crate::merge::{apply_type_styles, merge_map_profiles};
use crate::options::{ReadOptions, SheetHandleOptions, WriteOptions};
use crate::projection::{
    plan_pages, project_rows, read_column_values, resolve_read_mapping, resolve_write_mapping,
    write_column_values, write_rows,
};
use crate::record::{RecordDescriptor, SheetRecord};
use crate::selector::SheetSelector;
use crate::table::DataTable;
use crate::value::{FieldValue, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetInput {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl SheetInput {
    fn open(&self) -> Result<Box<dyn Read + '_>> {
        match self {
            SheetInput::File(path) => {
                let file = File::open(path).map_err(|err| {
                    SheetError::Io(io::Error::new(
                        err.kind(),
                        format!("Opening workbook {path:?}: {err}"),
                    ))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            SheetInput::Bytes(bytes) => Ok(Box::new(bytes.as_slice())),
        }
    }

    fn load<B: SheetBackend>(&self, backend: &B) -> Result<B::Workbook> {
        let mut reader = self.open()?;
        backend.open(&mut reader)
    }
}

impl fmt::Display for SheetInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetInput::File(path) => write!(f, "{}", path.display()),
            SheetInput::Bytes(bytes) => write!(f, "<{} byte(s)>", bytes.len()),
        }
    }
}

impl From<PathBuf> for SheetInput {
    fn from(path: PathBuf) -> Self {
        SheetInput::File(path)
    }
}

impl From<&Path> for SheetInput {
    fn from(path: &Path) -> Self {
        SheetInput::File(path.to_path_buf())
    }
}

impl From<Vec<u8>> for SheetInput {
    fn from(bytes: Vec<u8>) -> Self {
        SheetInput::Bytes(bytes)
    }
}

impl From<&[u8]> for SheetInput {
    fn from(bytes: &[u8]) -> Self {
        SheetInput::Bytes(bytes.to_vec())
    }
}

fn sheet_at<'w>(workbook: &'w dyn WorkbookSource, index: usize) -> Result<&'w dyn SheetSource> {
    workbook.sheet_at(index).ok_or(SheetError::IndexOutOfRange {
        index,
        count: workbook.sheet_count(),
    })
}

fn finish<W: WorkbookSink>(writer: &W) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    writer.serialize(&mut bytes)?;
    Ok(bytes)
}

#[derive(Debug)]
pub struct SheetWrapper<B> {
    backend: Arc<B>,
}

impl<B> Clone for SheetWrapper<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: SheetBackend> SheetWrapper<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    async fn run<R, F>(&self, operation: &'static str, cancel: &CancellationToken, work: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&B) -> Result<R> + Send + 'static,
    {
        if cancel.is_cancelled() {
            info!("{operation} cancelled before it started");
            return Err(SheetError::Cancelled);
        }
        let backend = Arc::clone(&self.backend);
        let started = Instant::now();
        let handle = tokio::task::spawn_blocking(move || work(&*backend));
        let outcome = tokio::select! {
            joined = handle => joined.map_err(|err| SheetError::Worker(err.to_string()))?,
            _ = cancel.cancelled() => {
                info!("{operation} cancelled while running");
                return Err(SheetError::Cancelled);
            }
        };
        debug!("{operation} finished in {:?}", started.elapsed());
        outcome
    }

    /// Reads the selected sheets into one table; columns are added the first
    /// time a sheet maps them.
    pub async fn read_to_table(
        &self,
        input: impl Into<SheetInput>,
        options: Option<ReadOptions>,
        sheets: impl Into<SheetSelector>,
        cancel: &CancellationToken,
    ) -> Result<DataTable> {
        let input = input.into();
        let selector = sheets.into();
        let options = options.unwrap_or_default();
        options.validate()?;
        selector.validate()?;
        info!("Reading {input} into a table");

        self.run("read_to_table", cancel, move |backend| {
            let workbook = input.load(backend)?;
            let mut table = DataTable::new();
            for index in selector.resolve(&workbook)? {
                let sheet = sheet_at(&workbook, index)?;
                let mapping = resolve_read_mapping(sheet, &options)?;
                let slots = mapping
                    .names()
                    .map(|name| (name, table.ensure_column(name)))
                    .collect::<HashMap<_, _>>();
                let rows = project_rows(
                    sheet,
                    &options,
                    &mapping,
                    || table.new_row(),
                    |row, profile, value| {
                        if let Some(slot) = slots.get(profile.name()) {
                            row.set(*slot, value);
                        }
                        Ok(())
                    },
                )?;
                debug!("Read {} row(s) from sheet '{}'", rows.len(), sheet.name());
                table.extend_rows(rows);
            }
            Ok(table)
        })
        .await
    }

    pub async fn read_to_list<T: SheetRecord>(
        &self,
        input: impl Into<SheetInput>,
        options: Option<ReadOptions>,
        sheets: impl Into<SheetSelector>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let input = input.into();
        let selector = sheets.into();
        let mut options = options.unwrap_or_default();
        options.validate()?;
        selector.validate()?;
        let descriptor = RecordDescriptor::<T>::of();
        merge_map_profiles(&mut options, &descriptor)?;
        info!("Reading {input} into a list of {}", std::any::type_name::<T>());

        self.run("read_to_list", cancel, move |backend| {
            let workbook = input.load(backend)?;
            let accessors = descriptor.accessors();
            let mut items = Vec::new();
            for index in selector.resolve(&workbook)? {
                let sheet = sheet_at(&workbook, index)?;
                let mapping = resolve_read_mapping(sheet, &options)?;
                let rows = project_rows(
                    sheet,
                    &options,
                    &mapping,
                    T::default,
                    |item, profile, value| match accessors.get(profile.name()) {
                        Some(field) => field.set(item, value),
                        None => Ok(()),
                    },
                )?;
                debug!("Read {} row(s) from sheet '{}'", rows.len(), sheet.name());
                items.extend(rows);
            }
            Ok(items)
        })
        .await
    }

    /// Reads one column from `first_row` down, coercing each cell into `V`.
    pub async fn read_column<V>(
        &self,
        input: impl Into<SheetInput>,
        first_row: usize,
        column: usize,
        sheets: impl Into<SheetSelector>,
        cancel: &CancellationToken,
    ) -> Result<Vec<V>>
    where
        V: FieldValue + Send + 'static,
    {
        self.read_column_with(input, first_row, column, sheets, V::from_value, cancel)
            .await
    }

    pub async fn read_column_with<V, F>(
        &self,
        input: impl Into<SheetInput>,
        first_row: usize,
        column: usize,
        sheets: impl Into<SheetSelector>,
        converter: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<V>>
    where
        V: Send + 'static,
        F: Fn(Value) -> anyhow::Result<V> + Send + 'static,
    {
        let input = input.into();
        let selector = sheets.into();
        selector.validate()?;
        info!("Reading column {column} of {input}");

        self.run("read_column", cancel, move |backend| {
            let workbook = input.load(backend)?;
            let mut values = Vec::new();
            for index in selector.resolve(&workbook)? {
                let sheet = sheet_at(&workbook, index)?;
                values.extend(read_column_values(sheet, first_row, column, &converter)?);
            }
            Ok(values)
        })
        .await
    }

    pub async fn write_table(
        &self,
        table: DataTable,
        options: Option<WriteOptions>,
        sheet_name: &str,
        items_per_sheet: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let options = options.unwrap_or_default();
        options.validate()?;
        let pages = plan_pages(sheet_name, table.len(), items_per_sheet)?;
        info!("Writing {} row(s) over {} sheet(s)", table.len(), pages.len());

        self.run("write_table", cancel, move |backend| {
            let mapping =
                resolve_write_mapping(table.columns().iter().map(String::as_str), &options)?;
            let slots = table
                .columns()
                .iter()
                .enumerate()
                .map(|(index, name)| (name.as_str(), index))
                .collect::<HashMap<_, _>>();
            let mut writer = backend.create();
            for page in pages {
                let sheet = writer.create_sheet(&page.name)?;
                let rows = table.rows().get(page.rows).unwrap_or_default();
                write_rows(sheet, &options, &mapping, rows, |row, profile| {
                    Ok(slots
                        .get(profile.name())
                        .map(|slot| row.get(*slot).clone())
                        .unwrap_or_default())
                })?;
            }
            finish(&writer)
        })
        .await
    }

    pub async fn write_list<T: SheetRecord>(
        &self,
        items: Vec<T>,
        options: Option<WriteOptions>,
        sheet_name: &str,
        items_per_sheet: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut options = options.unwrap_or_default();
        options.validate()?;
        let descriptor = RecordDescriptor::<T>::of();
        merge_map_profiles(&mut options, &descriptor)?;
        apply_type_styles(&mut options, descriptor.styles());
        let pages = plan_pages(sheet_name, items.len(), items_per_sheet)?;
        info!(
            "Writing {} {} record(s) over {} sheet(s)",
            items.len(),
            std::any::type_name::<T>(),
            pages.len()
        );

        self.run("write_list", cancel, move |backend| {
            let accessors = descriptor.accessors();
            let mapping =
                resolve_write_mapping(descriptor.fields().iter().map(|field| field.name()), &options)?;
            let mut writer = backend.create();
            for page in pages {
                let sheet = writer.create_sheet(&page.name)?;
                let rows = items.get(page.rows).unwrap_or_default();
                write_rows(sheet, &options, &mapping, rows, |item, profile| {
                    Ok(accessors
                        .get(profile.name())
                        .map(|field| field.get(item))
                        .unwrap_or_default())
                })?;
            }
            finish(&writer)
        })
        .await
    }

    pub async fn write_column<V>(
        &self,
        items: Vec<V>,
        first_row: usize,
        column: usize,
        sheet_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>
    where
        V: FieldValue + Send + 'static,
    {
        self.write_column_with(
            items,
            first_row,
            column,
            sheet_name,
            |item: &V| Ok(item.to_value()),
            cancel,
        )
        .await
    }

    pub async fn write_column_with<V, F>(
        &self,
        items: Vec<V>,
        first_row: usize,
        column: usize,
        sheet_name: &str,
        converter: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>
    where
        V: Send + 'static,
        F: Fn(&V) -> anyhow::Result<Value> + Send + 'static,
    {
        let pages = plan_pages(sheet_name, items.len(), None)?;
        info!("Writing {} value(s) into column {column}", items.len());

        self.run("write_column", cancel, move |backend| {
            let mut writer = backend.create();
            for page in pages {
                let sheet = writer.create_sheet(&page.name)?;
                write_column_values(sheet, first_row, column, &items, &converter)?;
            }
            finish(&writer)
        })
        .await
    }
}
