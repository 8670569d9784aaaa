//! Dotted field path resolution
//!
//! `header.stamp.sec`, `ranges[3]`, `points[0].x`

use std::borrow::Cow;
use std::fmt;

use contracts::{FieldValue, SampleError};

use crate::error::{CompileError, Result};

/// One dotted segment with optional sequence indices
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    name: String,
    indices: Vec<usize>,
}

/// Pre-parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a dotted path
    ///
    /// # Errors
    /// Empty segments, unterminated or non-numeric indices.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| CompileError::InvalidFieldPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("empty path"));
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(invalid("empty segment"));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("segment names may only contain [A-Za-z0-9_]"));
            }

            let mut indices = Vec::new();
            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .filter(|_| rest.starts_with('['))
                    .ok_or_else(|| invalid("unterminated index"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("index must be a non-negative integer"))?;
                indices.push(index);
                rest = &rest[close + 1..];
            }

            segments.push(Segment {
                name: name.to_string(),
                indices,
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk the message tree along this path
    ///
    /// # Errors
    /// `SampleError::FieldNotFound` when any segment is absent for this message.
    pub fn resolve(&self, root: &FieldValue) -> std::result::Result<FieldValue, SampleError> {
        let mut current = Cow::Borrowed(root);
        for segment in &self.segments {
            current = match member(&current, &segment.name) {
                Some(value) => value,
                None => {
                    return Err(SampleError::field_not_found(
                        &self.raw,
                        format!(
                            "no member '{}' in {} value",
                            segment.name,
                            current.type_name()
                        ),
                    ))
                }
            };
            for &index in &segment.indices {
                current = element(&current, index).ok_or_else(|| {
                    SampleError::field_not_found(
                        &self.raw,
                        format!(
                            "index {} out of range for {} '{}'",
                            index,
                            current.type_name(),
                            segment.name
                        ),
                    )
                })?;
            }
        }
        Ok(current.into_owned())
    }
}

// 只有字节缓冲元素是新建值，其余节点按引用遍历
fn member<'a>(value: &Cow<'a, FieldValue>, name: &str) -> Option<Cow<'a, FieldValue>> {
    match value {
        Cow::Borrowed(v) => {
            let v: &'a FieldValue = *v;
            v.member(name).map(Cow::Borrowed)
        }
        Cow::Owned(v) => v.member(name).cloned().map(Cow::Owned),
    }
}

fn element<'a>(value: &Cow<'a, FieldValue>, index: usize) -> Option<Cow<'a, FieldValue>> {
    match value {
        Cow::Borrowed(v) => {
            let v: &'a FieldValue = *v;
            match v {
                FieldValue::Sequence(items) => items.get(index).map(Cow::Borrowed),
                other => other.element(index).map(Cow::Owned),
            }
        }
        Cow::Owned(v) => v.element(index).map(Cow::Owned),
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
