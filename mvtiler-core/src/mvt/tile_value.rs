use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::mvt::proto;
use crate::{TilerError, TilerResult};

/// Attribute value of a feature, one variant per MVT value field.
#[derive(Debug, Clone)]
pub enum TileValue {
    /// UTF-8 string
    Str(String),
    /// 32 bit float
    Float(f32),
    /// 64 bit float
    Double(f64),
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Signed integer, zigzag encoded on the wire
    Sint(i64),
    /// Boolean
    Bool(bool),
}

// Floats compare by bit pattern so that values can be deduplicated in a hash map.
impl PartialEq for TileValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Int(a), Self::Int(b)) | (Self::Sint(a), Self::Sint(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TileValue {}

impl Hash for TileValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Str(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Double(v) => v.to_bits().hash(state),
            Self::Int(v) | Self::Sint(v) => v.hash(state),
            Self::Uint(v) => v.hash(state),
            Self::Bool(v) => v.hash(state),
        }
    }
}

impl Display for TileValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Int(v) | Self::Sint(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<TileValue> for proto::Value {
    fn from(value: TileValue) -> Self {
        let mut result = Self::default();
        match value {
            TileValue::Str(v) => result.string_value = Some(v),
            TileValue::Float(v) => result.float_value = Some(v),
            TileValue::Double(v) => result.double_value = Some(v),
            TileValue::Int(v) => result.int_value = Some(v),
            TileValue::Uint(v) => result.uint_value = Some(v),
            TileValue::Sint(v) => result.sint_value = Some(v),
            TileValue::Bool(v) => result.bool_value = Some(v),
        }
        result
    }
}

impl TryFrom<proto::Value> for TileValue {
    type Error = TilerError;

    fn try_from(value: proto::Value) -> TilerResult<Self> {
        if let Some(v) = value.string_value {
            Ok(Self::Str(v))
        } else if let Some(v) = value.float_value {
            Ok(Self::Float(v))
        } else if let Some(v) = value.double_value {
            Ok(Self::Double(v))
        } else if let Some(v) = value.int_value {
            Ok(Self::Int(v))
        } else if let Some(v) = value.uint_value {
            Ok(Self::Uint(v))
        } else if let Some(v) = value.sint_value {
            Ok(Self::Sint(v))
        } else if let Some(v) = value.bool_value {
            Ok(Self::Bool(v))
        } else {
            Err(TilerError::EmptyValue)
        }
    }
}

impl From<&str> for TileValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for TileValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for TileValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for TileValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for TileValue {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<f64> for TileValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}
