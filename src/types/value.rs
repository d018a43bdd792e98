use std::fmt;

use serde::{Deserialize, Serialize};

/// A decoded field value. The variant records the on-disk width the value
/// was stored with, so `Int24(5)` and `Int64(5)` are different values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int8(i8),
    Int16(i16),
    Int24(i32),
    Int32(i32),
    Int48(i64),
    Int64(i64),
    Float64(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widens any integer variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int24(v) | Value::Int32(v) => Some(i64::from(*v)),
            Value::Int48(v) | Value::Int64(v) => Some(*v),
            Value::Null | Value::Float64(_) | Value::Text(_) | Value::Blob(_) => None,
        }
    }

    /// Payload size in bytes as stored in a record body.
    pub fn size(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Int8(_) => 1,
            Value::Int16(_) => 2,
            Value::Int24(_) => 3,
            Value::Int32(_) => 4,
            Value::Int48(_) => 6,
            Value::Int64(_) | Value::Float64(_) => 8,
            Value::Text(s) => s.len(),
            Value::Blob(b) => b.len(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int24(v) | Value::Int32(v) => write!(f, "{}", v),
            Value::Int48(v) | Value::Int64(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on integral floats
            Value::Float64(v) => write!(f, "{:?}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(bytes) => {
                write!(f, "x'")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "'")
            }
        }
    }
}
