//! The closed set of scalar types a path, query, header or form binder accepts.

use serde_json::{json, Value};

/// Tag for each supported scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Float32,
    Float64,
    Bytes,
}

impl ScalarKind {
    /// JSON Schema used for parameters and form fields of this kind
    #[must_use]
    pub fn schema(self) -> Value {
        match self {
            ScalarKind::String => json!({"type": "string"}),
            ScalarKind::Integer => json!({"type": "integer"}),
            ScalarKind::Float32 => json!({"type": "number", "format": "float"}),
            ScalarKind::Float64 => json!({"type": "number", "format": "double"}),
            ScalarKind::Bytes => json!({"type": "string", "format": "binary"}),
        }
    }
}

/// A scalar converted from request text.
///
/// Missing values are passed in as `""`, which binds to text and bytes but is
/// rejected by the numeric kinds.
pub trait ScalarValue: Sized {
    const KIND: ScalarKind;

    /// Convert raw text; the error is a human-readable reason
    fn from_text(text: &str) -> Result<Self, String>;
}

impl ScalarValue for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn from_text(text: &str) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

impl ScalarValue for Vec<u8> {
    const KIND: ScalarKind = ScalarKind::Bytes;

    fn from_text(text: &str) -> Result<Self, String> {
        Ok(text.as_bytes().to_vec())
    }
}

macro_rules! parsed_scalar {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(impl ScalarValue for $ty {
            const KIND: ScalarKind = $kind;

            fn from_text(text: &str) -> Result<Self, String> {
                text.parse::<$ty>()
                    .map_err(|e| format!("`{text}` is not a valid {}: {e}", stringify!($ty)))
            }
        })*
    };
}

parsed_scalar!(
    i32 => ScalarKind::Integer,
    i64 => ScalarKind::Integer,
    f32 => ScalarKind::Float32,
    f64 => ScalarKind::Float64,
);
