//! Handle options shared by read and write operations.
//!
//! `HandleOptions` carries the sheet geometry (header row, first column, row
//! cap), the registered column-map profiles and the ignore set. `ReadOptions`
//! and `WriteOptions` wrap it and differ in how they look profiles up:
//!
//! - read options key profiles and ignore entries by **column name**, since the
//!   header text is what a reader sees first;
//! - write options key them by **logical name**, since a writer starts from the
//!   record's fields.
//!
//! Registration enforces uniqueness of both the logical name and the column
//! name within one options instance.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use log::debug;

use crate::converter::{ConverterType, Direction, ValueConverter};
use crate::error::{Result, SheetError};
use crate::profile::ColumnMapProfile;
use crate::style::CellStyle;
use crate::value::Value;

/// Case-insensitive set of names excluded from mapping.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: Vec<String>,
}

fn same_name(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

impl IgnoreSet {
    /// Adds `name` unless it is blank or already present in any casing.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.trim().is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| same_name(existing, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Highest 1-based header row a sheet can hold.
pub const MAX_ROW_NUMBER: usize = 1_048_576;
/// Highest 1-based column a sheet can hold.
pub const MAX_COLUMN_NUMBER: usize = 16_384;

#[derive(Debug, Clone)]
pub struct HandleOptions {
    /// 1-based row holding the headers.
    pub header_row_number: usize,
    /// 1-based column where mapping starts.
    pub first_column_number: usize,
    /// Maximum number of data rows to read; `None` reads to the last row.
    pub row_count: Option<usize>,
    mapping: Vec<ColumnMapProfile>,
    ignored: IgnoreSet,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            header_row_number: 1,
            first_column_number: 1,
            row_count: None,
            mapping: Vec::new(),
            ignored: IgnoreSet::default(),
        }
    }
}

impl HandleOptions {
    pub fn mapping(&self) -> &[ColumnMapProfile] {
        &self.mapping
    }

    pub fn ignored(&self) -> &IgnoreSet {
        &self.ignored
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.header_row_number < 1 {
            return Err(SheetError::InvalidConfiguration(format!(
                "header_row_number must be at least 1, got {}",
                self.header_row_number
            )));
        }
        if self.first_column_number < 1 {
            return Err(SheetError::InvalidConfiguration(format!(
                "first_column_number must be at least 1, got {}",
                self.first_column_number
            )));
        }
        if self.header_row_number > MAX_ROW_NUMBER {
            return Err(SheetError::InvalidConfiguration(format!(
                "header_row_number must be at most {MAX_ROW_NUMBER}, got {}",
                self.header_row_number
            )));
        }
        if self.first_column_number > MAX_COLUMN_NUMBER {
            return Err(SheetError::InvalidConfiguration(format!(
                "first_column_number must be at most {MAX_COLUMN_NUMBER}, got {}",
                self.first_column_number
            )));
        }
        Ok(())
    }

    fn register(&mut self, profile: ColumnMapProfile) -> Result<()> {
        if self.mapping.iter().any(|existing| existing.name() == profile.name()) {
            return Err(SheetError::DuplicateName(format!(
                "A profile named '{}' is already registered",
                profile.name()
            )));
        }
        if let Some(existing) = self
            .mapping
            .iter()
            .find(|existing| existing.column_name() == profile.column_name())
        {
            return Err(SheetError::DuplicateName(format!(
                "Column '{}' is already mapped to '{}'",
                profile.column_name(),
                existing.name()
            )));
        }
        debug!(
            "Registered profile '{}' -> column '{}'",
            profile.name(),
            profile.column_name()
        );
        self.mapping.push(profile);
        Ok(())
    }
}

pub trait SheetHandleOptions: Clone + Send + 'static {
    const DIRECTION: Direction;

    fn handle(&self) -> &HandleOptions;

    fn handle_mut(&mut self) -> &mut HandleOptions;

    /// Looks a profile up by the key this options kind is organised around.
    fn get_map_profile(&self, key: &str) -> Option<&ColumnMapProfile>;

    /// Excludes a field, recording whichever of its names this options kind
    /// filters on.
    fn ignore_property(&mut self, name: &str, column_name: &str);

    fn ignore_name<I, S>(&mut self, names: I) -> &mut Self
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.handle_mut().ignored.insert(name.as_ref());
        }
        self
    }

    fn add_map_profile(&mut self, profile: ColumnMapProfile) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.handle_mut().register(profile.bind(Self::DIRECTION))?;
        Ok(self)
    }

    fn add_column(
        &mut self,
        name: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.add_map_profile(ColumnMapProfile::with_column(name, column_name)?)
    }

    fn add_function<F>(
        &mut self,
        name: impl Into<String>,
        column_name: impl Into<String>,
        func: F,
    ) -> Result<&mut Self>
    where
        Self: Sized,
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.add_map_profile(ColumnMapProfile::with_function(name, column_name, func)?)
    }

    fn add_converter(
        &mut self,
        name: impl Into<String>,
        column_name: impl Into<String>,
        converter: Arc<dyn ValueConverter>,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.add_map_profile(ColumnMapProfile::with_converter(name, column_name, converter)?)
    }

    fn add_converter_type(
        &mut self,
        name: impl Into<String>,
        column_name: impl Into<String>,
        converter: ConverterType,
    ) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.add_map_profile(ColumnMapProfile::with_converter_type(
            name,
            column_name,
            converter,
        )?)
    }

    fn validate(&self) -> Result<()> {
        self.handle().validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    handle: HandleOptions,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for ReadOptions {
    type Target = HandleOptions;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl DerefMut for ReadOptions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}

impl SheetHandleOptions for ReadOptions {
    const DIRECTION: Direction = Direction::Read;

    fn handle(&self) -> &HandleOptions {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut HandleOptions {
        &mut self.handle
    }

    fn get_map_profile(&self, key: &str) -> Option<&ColumnMapProfile> {
        self.handle
            .mapping
            .iter()
            .find(|profile| profile.column_name() == key)
    }

    fn ignore_property(&mut self, _name: &str, column_name: &str) {
        self.handle.ignored.insert(column_name);
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    handle: HandleOptions,
    pub header_style: Option<CellStyle>,
    pub body_style: Option<CellStyle>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for WriteOptions {
    type Target = HandleOptions;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl DerefMut for WriteOptions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}

impl SheetHandleOptions for WriteOptions {
    const DIRECTION: Direction = Direction::Write;

    fn handle(&self) -> &HandleOptions {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut HandleOptions {
        &mut self.handle
    }

    fn get_map_profile(&self, key: &str) -> Option<&ColumnMapProfile> {
        self.handle
            .mapping
            .iter()
            .find(|profile| profile.name() == key)
    }

    fn ignore_property(&mut self, name: &str, _column_name: &str) {
        self.handle.ignored.insert(name);
    }
}
