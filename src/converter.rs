//! Value converters sit between a cell payload and a record field.
//!
//! A converter translates in two directions: `convert_cell_value` runs while
//! reading (cell to field value) and `convert_item_value` runs while writing
//! (field value to cell). Profiles reach a converter in one of three forms: a
//! plain function, a shared instance, or a converter type that is
//! instantiated through its `Default` implementation.

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetError};
use crate::value::Value;

pub type ConvertFn = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

pub trait ValueConverter: Send + Sync {
    fn convert_cell_value(&self, value: Value) -> anyhow::Result<Value>;
    fn convert_item_value(&self, value: Value) -> anyhow::Result<Value>;
}

/// Which side of the boundary an options instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Converter assembled from optional per-direction functions. A missing
/// direction passes values through untouched.
#[derive(Clone, Default)]
pub struct FnConverter {
    cell_to_value: Option<ConvertFn>,
    value_to_cell: Option<ConvertFn>,
}

impl FnConverter {
    pub fn new(cell_to_value: Option<ConvertFn>, value_to_cell: Option<ConvertFn>) -> Self {
        Self {
            cell_to_value,
            value_to_cell,
        }
    }

    pub fn reading<F>(func: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(Some(Arc::new(func)), None)
    }

    pub fn writing<F>(func: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(None, Some(Arc::new(func)))
    }

    /// Binds a bare function to the direction the owning options drive.
    pub fn bound(func: ConvertFn, direction: Direction) -> Self {
        match direction {
            Direction::Read => Self::new(Some(func), None),
            Direction::Write => Self::new(None, Some(func)),
        }
    }
}

impl ValueConverter for FnConverter {
    fn convert_cell_value(&self, value: Value) -> anyhow::Result<Value> {
        match &self.cell_to_value {
            Some(func) => func(value),
            None => Ok(value),
        }
    }

    fn convert_item_value(&self, value: Value) -> anyhow::Result<Value> {
        match &self.value_to_cell {
            Some(func) => func(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for FnConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConverter")
            .field("cell_to_value", &self.cell_to_value.is_some())
            .field("value_to_cell", &self.value_to_cell.is_some())
            .finish()
    }
}

/// A converter type that can be instantiated without arguments.
#[derive(Clone, Copy)]
pub struct ConverterType {
    name: &'static str,
    factory: fn() -> Arc<dyn ValueConverter>,
}

impl ConverterType {
    pub fn of<C>() -> Self
    where
        C: ValueConverter + Default + 'static,
    {
        fn build<C: ValueConverter + Default + 'static>() -> Arc<dyn ValueConverter> {
            Arc::new(C::default())
        }
        Self {
            name: type_name::<C>(),
            factory: build::<C>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Arc<dyn ValueConverter> {
        (self.factory)()
    }
}

impl fmt::Debug for ConverterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConverterType").field(&self.name).finish()
    }
}

/// Named converter types that persisted profile documents may refer to.
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    entries: BTreeMap<String, ConverterType>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, converter: ConverterType) -> &mut Self {
        self.entries.insert(name.into(), converter);
        self
    }

    pub fn with<C>(mut self, name: impl Into<String>) -> Self
    where
        C: ValueConverter + Default + 'static,
    {
        self.register(name, ConverterType::of::<C>());
        self
    }

    pub fn resolve(&self, name: &str) -> Result<ConverterType> {
        self.entries.get(name).copied().ok_or_else(|| {
            SheetError::InvalidConfiguration(format!(
                "No converter is registered as '{name}' (known: {})",
                self.names().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueReplacement {
    pub from: String,
    pub to: String,
}

/// Swaps exact cell text for replacement text while reading and back again
/// while writing. Unmatched values pass through.
#[derive(Debug, Clone, Default)]
pub struct ReplaceConverter {
    replacements: Vec<ValueReplacement>,
}

impl ReplaceConverter {
    pub fn new(replacements: Vec<ValueReplacement>) -> Self {
        Self { replacements }
    }

    pub fn replacements(&self) -> &[ValueReplacement] {
        &self.replacements
    }
}

impl ValueConverter for ReplaceConverter {
    fn convert_cell_value(&self, value: Value) -> anyhow::Result<Value> {
        let text = value.as_display();
        Ok(self
            .replacements
            .iter()
            .find(|replacement| replacement.from == text)
            .map(|replacement| Value::String(replacement.to.clone()))
            .unwrap_or(value))
    }

    fn convert_item_value(&self, value: Value) -> anyhow::Result<Value> {
        let text = value.as_display();
        Ok(self
            .replacements
            .iter()
            .find(|replacement| replacement.to == text)
            .map(|replacement| Value::String(replacement.from.clone()))
            .unwrap_or(value))
    }
}
