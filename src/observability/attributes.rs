//! Heterogeneous attribute values shared by spans, metric labels and log fields.

use std::borrow::Cow;
use std::fmt;

/// A tagged attribute value.
///
/// Types without a dedicated variant are stringified through
/// [`Value::display`] instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Fallback for any type without a dedicated variant.
    pub fn display(value: impl fmt::Display) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

macro_rules! impl_from_small_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_small_int!(i8, i16, i32, i64, u8, u16, u32);

// Values above i64::MAX keep their digits as a string.
impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::display(value), Self::Int)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::display(value), Self::Int)
    }
}

/// A key and its attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<&KeyValue> for opentelemetry::KeyValue {
    fn from(kv: &KeyValue) -> Self {
        let value = match &kv.value {
            Value::String(s) => opentelemetry::Value::from(s.clone()),
            Value::Int(i) => opentelemetry::Value::I64(*i),
            Value::Float(v) => opentelemetry::Value::F64(*v),
            Value::Bool(b) => opentelemetry::Value::Bool(*b),
        };
        opentelemetry::KeyValue::new(kv.key.to_string(), value)
    }
}

/// Renders a slice of attributes as `key=value` pairs separated by spaces.
pub struct DisplayAttributes<'a>(pub &'a [KeyValue]);

impl fmt::Display for DisplayAttributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kv) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match &kv.value {
                Value::String(s) => write!(f, "{}={:?}", kv.key, s)?,
                other => write!(f, "{}={}", kv.key, other)?,
            }
        }
        Ok(())
    }
}
