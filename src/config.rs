//! YAML profile documents.
//!
//! A profile document persists everything a [`ReadOptions`] or
//! [`WriteOptions`] instance carries except code: sheet geometry, the ignore
//! list, column profiles and write styles. Converters are referenced by name
//! and resolved through a [`ConverterRegistry`], or expressed inline as
//! `replace` lists of `{from, to}` text pairs.
//!
//! ```yaml
//! header_row_number: 1
//! ignore: [备注]
//! columns:
//!   - name: gender
//!     column: 性别
//!     replace:
//!       - { from: 男, to: "1" }
//!       - { from: 女, to: "2" }
//!   - name: birthdate
//!     column: 出生日期
//!     converter: excel_date
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::converter::{ConverterRegistry, ReplaceConverter, ValueReplacement};
use crate::error::{Result, SheetError};
use crate::options::{ReadOptions, SheetHandleOptions, WriteOptions};
use crate::profile::ColumnMapProfile;
use crate::style::CellStyle;

pub const CURRENT_PROFILE_VERSION: &str = "1.0";

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(
        default,
        rename = "column",
        alias = "column_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    #[serde(
        default,
        rename = "replace",
        alias = "value_replacements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub replacements: Vec<ValueReplacement>,
}

impl ColumnEntry {
    pub fn output_name(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.name)
    }

    fn to_profile(&self, registry: &ConverterRegistry) -> Result<ColumnMapProfile> {
        let column = self.output_name();
        let profile = match (&self.converter, self.replacements.is_empty()) {
            (Some(_), false) => {
                return Err(SheetError::InvalidConfiguration(format!(
                    "Column '{}' declares both a converter and replacements",
                    self.name
                )));
            }
            (Some(converter), true) => ColumnMapProfile::with_converter_type(
                self.name.as_str(),
                column,
                registry.resolve(converter)?,
            )?,
            (None, false) => ColumnMapProfile::with_converter(
                self.name.as_str(),
                column,
                Arc::new(ReplaceConverter::new(self.replacements.clone())),
            )?,
            (None, true) => ColumnMapProfile::with_column(self.name.as_str(), column)?,
        };
        Ok(profile.ordered(self.order))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_version: Option<String>,
    #[serde(default = "ProfileDocument::default_position")]
    pub header_row_number: usize,
    #[serde(default = "ProfileDocument::default_position")]
    pub first_column_number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_style: Option<CellStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_style: Option<CellStyle>,
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self {
            profile_version: Some(CURRENT_PROFILE_VERSION.to_string()),
            header_row_number: 1,
            first_column_number: 1,
            row_count: None,
            ignore: Vec::new(),
            columns: Vec::new(),
            header_style: None,
            body_style: None,
        }
    }
}

impl ProfileDocument {
    pub const fn default_position() -> usize {
        1
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            SheetError::Io(io::Error::new(
                err.kind(),
                format!("Opening profile file {path:?}: {err}"),
            ))
        })?;
        let document: ProfileDocument = serde_yaml::from_reader(BufReader::new(file))?;
        info!(
            "Loaded profile document {path:?} with {} column(s)",
            document.columns.len()
        );
        Ok(document)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        let mut document = self.clone();
        if document.profile_version.is_none() {
            document.profile_version = Some(CURRENT_PROFILE_VERSION.to_string());
        }
        Ok(serde_yaml::to_string(&document)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_yaml_string()?;
        std::fs::write(path, text).map_err(|err| {
            SheetError::Io(io::Error::new(
                err.kind(),
                format!("Writing profile file {path:?}: {err}"),
            ))
        })
    }

    /// Captures the geometry, ignore list and column names of `options`.
    /// Converters cannot be persisted and are left out.
    pub fn from_options<O: SheetHandleOptions>(options: &O) -> Self {
        let handle = options.handle();
        Self {
            header_row_number: handle.header_row_number,
            first_column_number: handle.first_column_number,
            row_count: handle.row_count,
            ignore: handle.ignored().iter().map(str::to_string).collect(),
            columns: handle
                .mapping()
                .iter()
                .map(|profile| ColumnEntry {
                    name: profile.name().to_string(),
                    column_name: (profile.column_name() != profile.name())
                        .then(|| profile.column_name().to_string()),
                    ignore: profile.is_ignored(),
                    order: profile.order(),
                    converter: None,
                    replacements: Vec::new(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn apply_to<O: SheetHandleOptions>(
        &self,
        options: &mut O,
        registry: &ConverterRegistry,
    ) -> Result<()> {
        let handle = options.handle_mut();
        handle.header_row_number = self.header_row_number;
        handle.first_column_number = self.first_column_number;
        handle.row_count = self.row_count;
        options.ignore_name(&self.ignore);
        for entry in &self.columns {
            if entry.ignore {
                options.ignore_property(&entry.name, entry.output_name());
                continue;
            }
            options.add_map_profile(entry.to_profile(registry)?)?;
        }
        options.validate()
    }

    pub fn read_options(&self, registry: &ConverterRegistry) -> Result<ReadOptions> {
        let mut options = ReadOptions::new();
        self.apply_to(&mut options, registry)?;
        Ok(options)
    }

    pub fn write_options(&self, registry: &ConverterRegistry) -> Result<WriteOptions> {
        let mut options = WriteOptions::new();
        self.apply_to(&mut options, registry)?;
        options.header_style = self.header_style.clone();
        options.body_style = self.body_style.clone();
        Ok(options)
    }
}
