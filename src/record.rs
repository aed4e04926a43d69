//! Typed field access for records.
//!
//! A record type describes its fields once through [`SheetRecord::describe`];
//! the resulting [`RecordDescriptor`] is the accessor table the read and write
//! paths use to get and set values by logical name without runtime
//! reflection. Each field may also carry declarative column metadata, and the
//! type may carry header/body style declarations.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use crate::profile::ColumnMapAttribute;
use crate::style::TypeStyles;
use crate::value::{FieldValue, Value};

pub trait SheetRecord: Default + Send + Sync + 'static {
    fn describe(record: &mut RecordDescriptor<Self>);
}

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> anyhow::Result<()> + Send + Sync>;

pub struct FieldDescriptor<T> {
    name: &'static str,
    getter: Getter<T>,
    setter: Setter<T>,
    attribute: Option<ColumnMapAttribute>,
}

impl<T> FieldDescriptor<T> {
    pub fn column(&mut self, attribute: ColumnMapAttribute) -> &mut Self {
        self.attribute = Some(attribute);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn attribute(&self) -> Option<&ColumnMapAttribute> {
        self.attribute.as_ref()
    }

    pub fn get(&self, item: &T) -> Value {
        (self.getter)(item)
    }

    /// Empty values leave the field untouched.
    pub fn set(&self, item: &mut T, value: Value) -> anyhow::Result<()> {
        if matches!(value, Value::Empty) {
            return Ok(());
        }
        (self.setter)(item, value)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("attribute", &self.attribute)
            .finish()
    }
}

pub struct RecordDescriptor<T> {
    fields: Vec<FieldDescriptor<T>>,
    styles: TypeStyles,
}

impl<T: 'static> Default for RecordDescriptor<T> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            styles: TypeStyles::default(),
        }
    }
}

impl<T: 'static> RecordDescriptor<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of() -> Self
    where
        T: SheetRecord,
    {
        let mut descriptor = Self::new();
        T::describe(&mut descriptor);
        descriptor
    }

    pub fn field<V>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut FieldDescriptor<T>
    where
        V: FieldValue + 'static,
    {
        let index = self.fields.len();
        self.fields.push(FieldDescriptor {
            name,
            getter: Box::new(move |item: &T| get(item).to_value()),
            setter: Box::new(move |item: &mut T, value: Value| {
                *get_mut(item) = V::from_value(value)?;
                Ok(())
            }),
            attribute: None,
        });
        &mut self.fields[index]
    }

    pub fn styles(&self) -> &TypeStyles {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut TypeStyles {
        &mut self.styles
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Name-to-accessor lookup built once per operation.
    pub fn accessors(&self) -> HashMap<&'static str, &FieldDescriptor<T>> {
        let mut accessors = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            accessors.entry(field.name).or_insert(field);
        }
        accessors
    }
}

impl<T> fmt::Debug for RecordDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("fields", &self.fields)
            .field("styles", &self.styles)
            .finish()
    }
}

/// Typed reference to a record field, produced by [`property!`](crate::property).
pub struct PropertyRef<T, V> {
    path: &'static str,
    accessor: fn(&T) -> &V,
    _marker: PhantomData<fn() -> V>,
}

impl<T, V> PropertyRef<T, V> {
    pub fn new(path: &'static str, accessor: fn(&T) -> &V) -> Self {
        Self {
            path,
            accessor,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn get<'a>(&self, item: &'a T) -> &'a V {
        (self.accessor)(item)
    }
}

/// Builds a [`PropertyRef`] from a record type and a field path.
///
/// ```
/// # use sheetmap::property;
/// #[derive(Default)]
/// struct Employee { name: String }
/// let name = property!(Employee, name);
/// assert_eq!(name.path(), "name");
/// ```
#[macro_export]
macro_rules! property {
    ($ty:ty, $($field:ident).+) => {
        $crate::record::PropertyRef::<$ty, _>::new(
            stringify!($($field).+),
            |item: &$ty| &item.$($field).+,
        )
    };
}
