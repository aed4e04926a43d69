//! Column mapping and row projection between spreadsheet-style workbooks and
//! typed records or shape-free tables.
//!
//! Options decide which columns take part, what they are called on each side
//! and how their values are converted; a [`SheetWrapper`] runs the read and
//! write operations over a concrete [`backend::SheetBackend`].

pub mod backend;
pub mod builder;
pub mod config;
pub mod converter;
pub mod error;
pub mod io_utils;
pub mod merge;
pub mod options;
pub mod profile;
pub mod projection;
pub mod record;
pub mod selector;
pub mod style;
pub mod table;
pub mod value;
pub mod wrapper;

use std::{env, sync::OnceLock};

use log::LevelFilter;

pub use crate::backend::{CsvBackend, MemoryBackend, MemorySheet, MemoryWorkbook};
pub use crate::builder::{OptionsBuilder, PropertyBuilder, TypeProfileBuilder};
pub use crate::config::{ColumnEntry, ProfileDocument};
pub use crate::converter::{
    ConverterRegistry, ConverterType, Direction, FnConverter, ReplaceConverter, ValueConverter,
    ValueReplacement,
};
pub use crate::error::{Result, SheetError};
pub use crate::options::{HandleOptions, ReadOptions, SheetHandleOptions, WriteOptions};
pub use crate::profile::{ColumnMapAttribute, ColumnMapProfile};
pub use crate::record::{FieldDescriptor, PropertyRef, RecordDescriptor, SheetRecord};
pub use crate::selector::SheetSelector;
pub use crate::style::{
    BorderAspect, BorderStyle, CellAspect, CellStyle, FontAspect, HorizontalAlignment,
    SectionStyles, StyleAspect, TypeStyles, VerticalAlignment,
};
pub use crate::table::{DataRow, DataTable};
pub use crate::value::{FieldValue, Value};
pub use crate::wrapper::{SheetInput, SheetWrapper};

pub use tokio_util::sync::CancellationToken;

static LOGGER: OnceLock<()> = OnceLock::new();

/// Installs an `env_logger` backend once per process. `RUST_LOG` wins when
/// set; otherwise this crate logs at `info`.
pub fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sheetmap", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}
