use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Value {
    #[default]
    Empty,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Guid(Uuid),
    Decimal(Decimal),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Guid(g) => g.to_string(),
            Value::Decimal(d) => d.to_string(),
        }
    }

    /// True when the value renders as an empty or whitespace-only string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Guid(_) => "guid",
            Value::Decimal(_) => "decimal",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

pub fn parse_bool(value: &str) -> Result<bool> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => bail!("Failed to parse '{value}' as boolean"),
    }
}

pub fn parse_guid(value: &str) -> Result<Uuid> {
    let trimmed = value.trim().trim_matches(|c| matches!(c, '{' | '}'));
    Uuid::parse_str(trimmed).with_context(|| format!("Failed to parse '{value}' as GUID"))
}

/// Field types a record can expose to the mapping engine.
///
/// `from_value` coerces a cell payload into the field type with the same
/// loose scalar rules a spreadsheet user expects: text parses into numbers,
/// dates, GUIDs and booleans, numbers narrow only when lossless.
pub trait FieldValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
    fn to_value(&self) -> Value;
}

fn blank_error(target: &str) -> anyhow::Error {
    anyhow!("A blank cell cannot be converted to {target}")
}

/// Whole-number payload of a value, widened so every supported integer type
/// can narrow from it with a range check.
fn whole_number(value: Value, target: &str) -> Result<i128> {
    // 2^127; every finite whole float below it converts to i128 exactly.
    const I128_LIMIT: f64 = 1.7014118346046923e38;
    match value {
        Value::Integer(i) => Ok(i128::from(i)),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if f >= -I128_LIMIT && f < I128_LIMIT {
                Ok(f as i128)
            } else {
                bail!("Value {f} is out of range for {target}")
            }
        }
        Value::Boolean(b) => Ok(i128::from(b)),
        Value::Decimal(d) if d.fract().is_zero() => d
            .to_i128()
            .ok_or_else(|| anyhow!("Decimal {d} does not fit in {target}")),
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .with_context(|| format!("Failed to parse '{s}' as {target}")),
        Value::Empty => Err(blank_error(target)),
        other => bail!("Cannot convert {} '{other}' to {target}", other.kind()),
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                let wide = whole_number(value, stringify!($ty))?;
                <$ty>::try_from(wide)
                    .with_context(|| format!("Value {wide} is out of range for {}", stringify!($ty)))
            }

            fn to_value(&self) -> Value {
                Value::Integer(i64::from(*self))
            }
        }
    )*};
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32);

impl FieldValue for u64 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = whole_number(value, "u64")?;
        u64::try_from(wide).with_context(|| format!("Value {wide} is out of range for u64"))
    }

    /// Values above `i64::MAX` are stored as exact decimals.
    fn to_value(&self) -> Value {
        i64::try_from(*self).map_or_else(|_| Value::Decimal(Decimal::from(*self)), Value::Integer)
    }
}

impl FieldValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            Value::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| anyhow!("Decimal {d} does not fit in a float")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Failed to parse '{s}' as float")),
            Value::Empty => Err(blank_error("f64")),
            other => bail!("Cannot convert {} '{other}' to f64", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FieldValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FieldValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            Value::Float(f) => Ok(f != 0.0),
            Value::String(s) => parse_bool(&s),
            Value::Empty => Err(blank_error("bool")),
            other => bail!("Cannot convert {} '{other}' to bool", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl FieldValue for String {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value.as_display())
    }

    fn to_value(&self) -> Value {
        if self.is_empty() {
            Value::Empty
        } else {
            Value::String(self.clone())
        }
    }
}

impl FieldValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::String(s) => {
                let trimmed = s.trim();
                parse_naive_date(trimmed)
                    .or_else(|_| parse_naive_datetime(trimmed).map(|dt| dt.date()))
            }
            Value::Empty => Err(blank_error("date")),
            other => bail!("Cannot convert {} '{other}' to date", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FieldValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            Value::String(s) => {
                let trimmed = s.trim();
                parse_naive_datetime(trimmed)
                    .or_else(|_| parse_naive_date(trimmed).map(|d| d.and_time(NaiveTime::MIN)))
            }
            Value::Empty => Err(blank_error("datetime")),
            other => bail!("Cannot convert {} '{other}' to datetime", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FieldValue for Uuid {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Guid(g) => Ok(g),
            Value::String(s) => parse_guid(&s),
            Value::Empty => Err(blank_error("GUID")),
            other => bail!("Cannot convert {} '{other}' to GUID", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Guid(*self)
    }
}

impl FieldValue for Decimal {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Integer(i) => Ok(Decimal::from(i)),
            Value::Float(f) => {
                Decimal::try_from(f).with_context(|| format!("Failed to convert {f} to decimal"))
            }
            Value::String(s) => s
                .trim()
                .parse::<Decimal>()
                .with_context(|| format!("Failed to parse '{s}' as decimal")),
            Value::Empty => Err(blank_error("decimal")),
            other => bail!("Cannot convert {} '{other}' to decimal", other.kind()),
        }
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl FieldValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        if value.is_blank() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Empty,
        }
    }
}
