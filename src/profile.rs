use std::fmt;
use std::sync::Arc;

use crate::converter::{ConvertFn, ConverterType, Direction, FnConverter, ValueConverter};
use crate::error::{Result, SheetError};
use crate::value::Value;

#[derive(Clone)]
pub enum ConverterSource {
    Function(ConvertFn),
    Instance(Arc<dyn ValueConverter>),
}

impl fmt::Debug for ConverterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterSource::Function(_) => f.write_str("Function"),
            ConverterSource::Instance(_) => f.write_str("Instance"),
        }
    }
}

/// Binds one logical field name to one physical column name, with an
/// optional converter, an ignore flag and a write order.
#[derive(Debug, Clone)]
pub struct ColumnMapProfile {
    name: String,
    column_name: String,
    ignore: bool,
    order: i32,
    converter: Option<ConverterSource>,
}

fn required(value: String, argument: &'static str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(SheetError::ArgumentMissing(argument));
    }
    Ok(value)
}

impl ColumnMapProfile {
    /// Profile whose column name equals its logical name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = required(name.into(), "name")?;
        Ok(Self::identity(&name))
    }

    pub fn with_column(name: impl Into<String>, column_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: required(name.into(), "name")?,
            column_name: required(column_name.into(), "column_name")?,
            ignore: false,
            order: 0,
            converter: None,
        })
    }

    pub fn with_function<F>(
        name: impl Into<String>,
        column_name: impl Into<String>,
        func: F,
    ) -> Result<Self>
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let mut profile = Self::with_column(name, column_name)?;
        profile.converter = Some(ConverterSource::Function(Arc::new(func)));
        Ok(profile)
    }

    pub fn with_converter(
        name: impl Into<String>,
        column_name: impl Into<String>,
        converter: Arc<dyn ValueConverter>,
    ) -> Result<Self> {
        let mut profile = Self::with_column(name, column_name)?;
        profile.converter = Some(ConverterSource::Instance(converter));
        Ok(profile)
    }

    pub fn with_converter_type(
        name: impl Into<String>,
        column_name: impl Into<String>,
        converter: ConverterType,
    ) -> Result<Self> {
        Self::with_converter(name, column_name, converter.instantiate())
    }

    pub(crate) fn identity(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_name: name.to_string(),
            ignore: false,
            order: 0,
            converter: None,
        }
    }

    pub fn ignored(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn ordered(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn converter(&self) -> Option<&ConverterSource> {
        self.converter.as_ref()
    }

    /// Turns a bare function into a converter bound to `direction`, so a
    /// registered profile always carries a single converter instance.
    pub(crate) fn bind(mut self, direction: Direction) -> Self {
        self.converter = match self.converter.take() {
            Some(ConverterSource::Function(func)) => Some(ConverterSource::Instance(Arc::new(
                FnConverter::bound(func, direction),
            ))),
            other => other,
        };
        self
    }

    pub fn convert_cell_value(&self, value: Value) -> anyhow::Result<Value> {
        match &self.converter {
            Some(ConverterSource::Function(func)) => func(value),
            Some(ConverterSource::Instance(converter)) => converter.convert_cell_value(value),
            None => Ok(value),
        }
    }

    pub fn convert_item_value(&self, value: Value) -> anyhow::Result<Value> {
        match &self.converter {
            Some(ConverterSource::Function(func)) => func(value),
            Some(ConverterSource::Instance(converter)) => converter.convert_item_value(value),
            None => Ok(value),
        }
    }
}

/// Declarative column metadata attached to a record field.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapAttribute {
    column_name: Option<String>,
    ignore: bool,
    order: i32,
    converter: Option<ConverterType>,
}

impl ColumnMapAttribute {
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: Some(column_name.into()),
            ..Self::default()
        }
    }

    /// Marks the field as excluded; every other setting is then moot.
    pub fn ignored() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn converter<C>(mut self) -> Self
    where
        C: ValueConverter + Default + 'static,
    {
        self.converter = Some(ConverterType::of::<C>());
        self
    }

    pub fn converter_type(mut self, converter: ConverterType) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn order_value(&self) -> i32 {
        self.order
    }

    pub fn converter_type_ref(&self) -> Option<&ConverterType> {
        self.converter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            ColumnMapProfile::new("  "),
            Err(SheetError::ArgumentMissing("name"))
        ));
        assert!(matches!(
            ColumnMapProfile::with_column("Name", ""),
            Err(SheetError::ArgumentMissing("column_name"))
        ));
    }

    #[test]
    fn binding_a_function_fixes_its_direction() {
        let profile = ColumnMapProfile::with_function("Gender", "性别", |_| Ok(Value::Integer(1)))
            .unwrap()
            .bind(Direction::Read);
        assert!(matches!(profile.converter(), Some(ConverterSource::Instance(_))));
        assert_eq!(profile.convert_cell_value(Value::from("男")).unwrap(), Value::Integer(1));
        assert_eq!(profile.convert_item_value(Value::Integer(2)).unwrap(), Value::Integer(2));
    }

    #[test]
    fn setters_chain() {
        let profile = ColumnMapProfile::with_column("Age", "年龄")
            .unwrap()
            .ordered(3)
            .ignored(true);
        assert_eq!(profile.order(), 3);
        assert!(profile.is_ignored());
        assert_eq!(profile.column_name(), "年龄");
    }
}
