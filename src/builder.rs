//! Fluent, type-checked profile configuration.
//!
//! ```
//! use sheetmap::{OptionsBuilder, ReadOptions, RecordDescriptor, SheetRecord, property};
//!
//! #[derive(Debug, Default)]
//! struct Employee {
//!     name: String,
//!     gender: i32,
//! }
//!
//! impl SheetRecord for Employee {
//!     fn describe(record: &mut RecordDescriptor<Self>) {
//!         record.field("name", |e| &e.name, |e| &mut e.name);
//!         record.field("gender", |e| &e.gender, |e| &mut e.gender);
//!     }
//! }
//!
//! let options = OptionsBuilder::<ReadOptions, Employee>::new()
//!     .configure_profile(|profile| {
//!         profile.property(property!(Employee, name))?.has_column_name("姓名")?;
//!         profile
//!             .property(property!(Employee, gender))?
//!             .has_column_name("性别")?
//!             .has_cell_converter(|cell| {
//!                 Ok(match cell.as_display().as_str() {
//!                     "男" => 1,
//!                     "女" => 2,
//!                     _ => 0,
//!                 })
//!             })?;
//!         Ok(())
//!     })?
//!     .build();
//! assert_eq!(options.mapping().len(), 2);
//! # Ok::<(), sheetmap::SheetError>(())
//! ```

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use log::debug;

use crate::converter::{ConvertFn, ConverterType, FnConverter, ValueConverter};
use crate::error::{Result, SheetError};
use crate::options::SheetHandleOptions;
use crate::profile::ColumnMapProfile;
use crate::record::{PropertyRef, RecordDescriptor, SheetRecord};
use crate::value::{FieldValue, Value};

pub struct OptionsBuilder<O, T> {
    options: O,
    _record: PhantomData<fn() -> T>,
}

impl<O, T> OptionsBuilder<O, T>
where
    O: SheetHandleOptions,
    T: SheetRecord,
{
    pub fn new() -> Self
    where
        O: Default,
    {
        Self::for_options(O::default())
    }

    pub fn for_options(options: O) -> Self {
        Self {
            options,
            _record: PhantomData,
        }
    }

    /// Runs `configure` against a fresh property builder and registers every
    /// declared property in one batch.
    pub fn configure_profile<F>(mut self, configure: F) -> Result<Self>
    where
        F: FnOnce(&mut TypeProfileBuilder<T>) -> Result<()>,
    {
        let mut profile = TypeProfileBuilder::new();
        configure(&mut profile)?;
        profile.apply(&mut self.options)?;
        Ok(self)
    }

    pub fn build(self) -> O {
        self.options
    }
}

impl<O, T> Default for OptionsBuilder<O, T>
where
    O: SheetHandleOptions + Default,
    T: SheetRecord,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
enum DraftConverter {
    #[default]
    None,
    Function(ConvertFn),
    Instance(Arc<dyn ValueConverter>),
    Directional {
        cell: Option<ConvertFn>,
        item: Option<ConvertFn>,
    },
}

struct ProfileDraft {
    name: String,
    column_name: Option<String>,
    ignore: bool,
    order: i32,
    converter: DraftConverter,
}

impl ProfileDraft {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_name: None,
            ignore: false,
            order: 0,
            converter: DraftConverter::None,
        }
    }

    fn conflict(&self) -> SheetError {
        SheetError::InvalidConfiguration(format!(
            "Property '{}' already has a converter",
            self.name
        ))
    }

    fn into_profile(self) -> Result<ColumnMapProfile> {
        let column_name = self.column_name.unwrap_or_else(|| self.name.clone());
        let profile = match self.converter {
            DraftConverter::None => ColumnMapProfile::with_column(self.name, column_name)?,
            DraftConverter::Function(func) => {
                ColumnMapProfile::with_function(self.name, column_name, move |value| func(value))?
            }
            DraftConverter::Instance(converter) => {
                ColumnMapProfile::with_converter(self.name, column_name, converter)?
            }
            DraftConverter::Directional { cell, item } => ColumnMapProfile::with_converter(
                self.name,
                column_name,
                Arc::new(FnConverter::new(cell, item)),
            )?,
        };
        Ok(profile.ordered(self.order))
    }
}

pub struct TypeProfileBuilder<T> {
    descriptor: RecordDescriptor<T>,
    drafts: Vec<ProfileDraft>,
}

fn is_member_name(path: &str) -> bool {
    let mut chars = path.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

impl<T: SheetRecord> TypeProfileBuilder<T> {
    fn new() -> Self {
        Self {
            descriptor: RecordDescriptor::of(),
            drafts: Vec::new(),
        }
    }

    /// Starts (or resumes) the configuration of one described field.
    pub fn property<V>(&mut self, property: PropertyRef<T, V>) -> Result<PropertyBuilder<'_, V>>
    where
        V: FieldValue + 'static,
    {
        let path = property.path();
        if !is_member_name(path) {
            return Err(SheetError::InvalidExpression(format!(
                "'{path}' is not a direct field of {}",
                type_name::<T>()
            )));
        }
        if self.descriptor.field_named(path).is_none() {
            return Err(SheetError::InvalidExpression(format!(
                "'{path}' is not a described field of {}",
                type_name::<T>()
            )));
        }
        let position = match self.drafts.iter().position(|draft| draft.name == path) {
            Some(position) => position,
            None => {
                self.drafts.push(ProfileDraft::new(path));
                self.drafts.len() - 1
            }
        };
        Ok(PropertyBuilder {
            draft: &mut self.drafts[position],
            _value: PhantomData,
        })
    }

    fn apply<O: SheetHandleOptions>(self, options: &mut O) -> Result<()> {
        let count = self.drafts.len();
        for draft in self.drafts {
            if draft.ignore {
                let column_name = draft.column_name.as_deref().unwrap_or(&draft.name);
                options.ignore_property(&draft.name, column_name);
                continue;
            }
            options.add_map_profile(draft.into_profile()?)?;
        }
        debug!("Configured {count} field(s) for {}", type_name::<T>());
        Ok(())
    }
}

pub struct PropertyBuilder<'a, V> {
    draft: &'a mut ProfileDraft,
    _value: PhantomData<fn() -> V>,
}

impl<V> PropertyBuilder<'_, V>
where
    V: FieldValue + 'static,
{
    pub fn ignore(self) -> Self {
        self.draft.ignore = true;
        self
    }

    pub fn has_column_name(self, column_name: impl Into<String>) -> Result<Self> {
        let column_name = column_name.into();
        if column_name.trim().is_empty() {
            return Err(SheetError::ArgumentMissing("column_name"));
        }
        self.draft.column_name = Some(column_name);
        Ok(self)
    }

    pub fn has_order(self, order: i32) -> Self {
        self.draft.order = order;
        self
    }

    /// One function applied in whichever direction the target options drive.
    pub fn has_converter<F>(self, func: F) -> Result<Self>
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        if !matches!(self.draft.converter, DraftConverter::None) {
            return Err(self.draft.conflict());
        }
        self.draft.converter = DraftConverter::Function(Arc::new(func));
        Ok(self)
    }

    /// Cell to field conversion used while reading.
    pub fn has_cell_converter<F>(self, func: F) -> Result<Self>
    where
        F: Fn(Value) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        let erased: ConvertFn = Arc::new(move |value| func(value).map(|typed| typed.to_value()));
        self.draft.converter = match std::mem::take(&mut self.draft.converter) {
            DraftConverter::None => DraftConverter::Directional {
                cell: Some(erased),
                item: None,
            },
            DraftConverter::Directional { cell: None, item } => DraftConverter::Directional {
                cell: Some(erased),
                item,
            },
            existing => {
                self.draft.converter = existing;
                return Err(self.draft.conflict());
            }
        };
        Ok(self)
    }

    /// Field to cell conversion used while writing.
    pub fn has_item_converter<F>(self, func: F) -> Result<Self>
    where
        F: Fn(&V) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let erased: ConvertFn = Arc::new(move |value| {
            let typed = V::from_value(value)?;
            func(&typed)
        });
        self.draft.converter = match std::mem::take(&mut self.draft.converter) {
            DraftConverter::None => DraftConverter::Directional {
                cell: None,
                item: Some(erased),
            },
            DraftConverter::Directional { cell, item: None } => DraftConverter::Directional {
                cell,
                item: Some(erased),
            },
            existing => {
                self.draft.converter = existing;
                return Err(self.draft.conflict());
            }
        };
        Ok(self)
    }

    pub fn has_value_converter(self, converter: Arc<dyn ValueConverter>) -> Result<Self> {
        if !matches!(self.draft.converter, DraftConverter::None) {
            return Err(self.draft.conflict());
        }
        self.draft.converter = DraftConverter::Instance(converter);
        Ok(self)
    }

    pub fn has_converter_type(self, converter: ConverterType) -> Result<Self> {
        self.has_value_converter(converter.instantiate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names_must_be_plain_identifiers() {
        assert!(is_member_name("gender"));
        assert!(is_member_name("_hidden"));
        assert!(!is_member_name("address.city"));
        assert!(!is_member_name("address . city"));
        assert!(!is_member_name("1st"));
        assert!(!is_member_name(""));
    }
}
