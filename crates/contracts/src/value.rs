//! FieldValue - decoded message field tree
//!
//! Number - evaluator scalar

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::Serialize;

/// A node of a decoded message
///
/// Messages are arbitrarily nested trees of named fields that may contain sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Contiguous byte buffer
    Bytes(Bytes),
    Sequence(Vec<FieldValue>),
    Struct(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Short type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Sequence(_) => "sequence",
            Self::Struct(_) => "struct",
        }
    }

    /// Named member of a struct node
    pub fn member(&self, name: &str) -> Option<&FieldValue> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Element of a sequence node (byte buffers are indexable too)
    pub fn element(&self, index: usize) -> Option<FieldValue> {
        match self {
            Self::Sequence(items) => items.get(index).cloned(),
            Self::Bytes(data) => data.get(index).map(|b| Self::UInt(u64::from(*b))),
            _ => None,
        }
    }

    /// Build a struct node from `(name, value)` pairs
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        Self::Sequence(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Bytes(data) => {
                for b in data.iter() {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Scalar produced by expression evaluation
///
/// Integer values stay exact so nanosecond timestamps survive arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(v) => v.is_finite(),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_and_element() {
        let msg = FieldValue::structure([
            ("data", FieldValue::Bytes(Bytes::from_static(&[1, 2, 3]))),
            ("ranges", FieldValue::from(vec![FieldValue::Float(0.5)])),
        ]);

        assert_eq!(
            msg.member("data").and_then(|d| d.element(2)),
            Some(FieldValue::UInt(3))
        );
        assert_eq!(
            msg.member("ranges").and_then(|r| r.element(0)),
            Some(FieldValue::Float(0.5))
        );
        assert!(msg.member("missing").is_none());
        assert!(FieldValue::Int(1).member("x").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Bytes(Bytes::from_static(&[0x0a, 0xff])).to_string(), "0aff");
        assert_eq!(
            FieldValue::from(vec![FieldValue::Int(1), FieldValue::Bool(true)]).to_string(),
            "[1, true]"
        );
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn test_number_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Number::Int(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&Number::Float(0.5)).unwrap(), "0.5");
    }
}
