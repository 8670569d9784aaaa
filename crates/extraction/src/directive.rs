//! Field directives
//!
//! A field reference in a parse string may carry a parenthesized directive:
//!
//! ```text
//! speed                       native value
//! speed(type:float32)         scalar cast
//! data(byte:0-4)              raw byte slice
//! data(byte:0-4,type:uint32)  byte slice decoded little-endian
//! ```

use std::fmt;

use contracts::{FieldValue, SampleError};

use crate::cast::{cast_scalar, decode_le};
use crate::error::{CompileError, Result};
use crate::path::FieldPath;
use crate::slice::extract_bytes;
use crate::types::TargetType;

/// How a referenced field is turned into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveMode {
    Native,
    Cast(TargetType),
    Slice { start: usize, len: usize },
    SliceCast {
        start: usize,
        len: usize,
        target: TargetType,
    },
}

impl fmt::Display for DirectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Cast(ty) => write!(f, "type:{ty}"),
            Self::Slice { start, len } => write!(f, "byte:{start}-{len}"),
            Self::SliceCast { start, len, target } => {
                write!(f, "byte:{start}-{len},type:{target}")
            }
        }
    }
}

/// Compiled directive for one field path
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDirective {
    pub path: FieldPath,
    pub mode: DirectiveMode,
}

impl FieldDirective {
    pub fn new(path: FieldPath, mode: DirectiveMode) -> Self {
        Self { path, mode }
    }

    pub fn byte_start(&self) -> Option<usize> {
        match self.mode {
            DirectiveMode::Slice { start, .. } | DirectiveMode::SliceCast { start, .. } => {
                Some(start)
            }
            _ => None,
        }
    }

    pub fn byte_length(&self) -> Option<usize> {
        match self.mode {
            DirectiveMode::Slice { len, .. } | DirectiveMode::SliceCast { len, .. } => Some(len),
            _ => None,
        }
    }

    pub fn target_type(&self) -> Option<TargetType> {
        match self.mode {
            DirectiveMode::Cast(ty) | DirectiveMode::SliceCast { target: ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Resolve the field in `message` and apply slicing/casting
    pub fn apply(&self, message: &FieldValue) -> std::result::Result<FieldValue, SampleError> {
        let path = self.path.as_str();
        let value = self.path.resolve(message)?;
        match self.mode {
            DirectiveMode::Native => Ok(value),
            DirectiveMode::Cast(target) => cast_scalar(path, &value, target),
            DirectiveMode::Slice { start, len } => {
                extract_bytes(path, &value, start, len).map(FieldValue::Bytes)
            }
            DirectiveMode::SliceCast { start, len, target } => {
                let slice = extract_bytes(path, &value, start, len)?;
                decode_le(path, &slice, target)
            }
        }
    }
}

/// Parse the text between a directive's parentheses
///
/// Keys `byte` and `type` may appear in either order, each at most once.
///
/// # Errors
/// Unknown keys and type names, malformed `key:value` pairs, zero-length
/// ranges, and slice widths that differ from the cast type's width.
pub fn parse_directive_body(field: &str, body: &str) -> Result<DirectiveMode> {
    let mut range: Option<(usize, usize)> = None;
    let mut target: Option<TargetType> = None;

    if body.trim().is_empty() {
        return Err(CompileError::malformed(field, body, "empty directive"));
    }

    for pair in body.split(',') {
        let (key, value) = pair.split_once(':').ok_or_else(|| {
            CompileError::malformed(
                field,
                body,
                format!("expected key:value, got '{}'", pair.trim()),
            )
        })?;
        let (key, value) = (key.trim(), value.trim());

        match key {
            "byte" => {
                if range.is_some() {
                    return Err(CompileError::malformed(field, body, "duplicate 'byte' key"));
                }
                range = Some(parse_range(field, body, value)?);
            }
            "type" => {
                if target.is_some() {
                    return Err(CompileError::malformed(field, body, "duplicate 'type' key"));
                }
                target = Some(TargetType::parse(value).ok_or_else(|| {
                    CompileError::UnknownTargetType {
                        field: field.to_string(),
                        name: value.to_string(),
                    }
                })?);
            }
            other => {
                return Err(CompileError::UnknownDirectiveKey {
                    field: field.to_string(),
                    key: other.to_string(),
                })
            }
        }
    }

    match (range, target) {
        (Some((start, len)), Some(target)) => {
            if len != target.size_bytes() {
                return Err(CompileError::InvalidByteRange {
                    field: field.to_string(),
                    reason: format!(
                        "{target} needs {} bytes but the range is {len} bytes long",
                        target.size_bytes()
                    ),
                });
            }
            Ok(DirectiveMode::SliceCast { start, len, target })
        }
        (Some((start, len)), None) => Ok(DirectiveMode::Slice { start, len }),
        (None, Some(target)) => Ok(DirectiveMode::Cast(target)),
        (None, None) => Err(CompileError::malformed(field, body, "no directive keys")),
    }
}

/// Parse `S-L` (start offset, length)
fn parse_range(field: &str, body: &str, value: &str) -> Result<(usize, usize)> {
    let (start, len) = value.split_once('-').ok_or_else(|| {
        CompileError::malformed(
            field,
            body,
            format!("byte range '{value}' is not START-LENGTH"),
        )
    })?;
    let number = |s: &str| {
        let s = s.trim();
        s.parse::<usize>().map_err(|_| {
            CompileError::malformed(field, body, format!("'{s}' is not a non-negative integer"))
        })
    };
    let (start, len) = (number(start)?, number(len)?);

    if len == 0 {
        return Err(CompileError::InvalidByteRange {
            field: field.to_string(),
            reason: "length must be at least 1".to_string(),
        });
    }
    if start.checked_add(len).is_none() {
        return Err(CompileError::InvalidByteRange {
            field: field.to_string(),
            reason: "range end overflows".to_string(),
        });
    }
    Ok((start, len))
}

/// Field reference found in a parse string
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Binding {
    pub field: String,
    pub mode: DirectiveMode,
}

/// Replace every field reference in `parse_string` with a `$k` placeholder
///
/// Returns the distinct bindings in order of first reference and the residual
/// expression. Numeric literals (including exponents) are copied through.
pub(crate) fn rewrite(parse_string: &str, declared: &[String]) -> Result<(Vec<Binding>, String)> {
    let bytes = parse_string.as_bytes();
    let mut bindings: Vec<Binding> = Vec::new();
    let mut residual = String::with_capacity(parse_string.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];

        let starts_number =
            c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit));
        if starts_number {
            let end = scan_number(bytes, pos);
            residual.push_str(&parse_string[pos..end]);
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            let end = scan_identifier(bytes, pos);
            let name = &parse_string[pos..end];
            pos = end;

            let opens_paren = bytes.get(pos) == Some(&b'(');
            if !declared.iter().any(|d| d == name) {
                return Err(if opens_paren {
                    CompileError::FunctionCall {
                        name: name.to_string(),
                    }
                } else {
                    CompileError::UndeclaredField {
                        name: name.to_string(),
                    }
                });
            }

            let mode = if opens_paren {
                let close = parse_string[pos..]
                    .find(')')
                    .map(|offset| pos + offset)
                    .ok_or_else(|| CompileError::UnterminatedDirective {
                        field: name.to_string(),
                    })?;
                let body = &parse_string[pos + 1..close];
                if body.contains('(') {
                    return Err(CompileError::UnterminatedDirective {
                        field: name.to_string(),
                    });
                }
                pos = close + 1;
                parse_directive_body(name, body)?
            } else {
                DirectiveMode::Native
            };

            let index = match bindings.iter().position(|b| b.field == name) {
                Some(i) if bindings[i].mode == mode => i,
                Some(i) => {
                    return Err(CompileError::ConflictingDirectives {
                        field: name.to_string(),
                        first: bindings[i].mode.to_string(),
                        second: mode.to_string(),
                    })
                }
                None => {
                    bindings.push(Binding {
                        field: name.to_string(),
                        mode,
                    });
                    bindings.len() - 1
                }
            };
            residual.push('$');
            residual.push_str(&index.to_string());
            continue;
        }

        if c == b'$' {
            return Err(CompileError::expression(
                pos,
                "'$' is not allowed in parse strings",
            ));
        }

        let ch = parse_string[pos..].chars().next().unwrap_or(' ');
        residual.push(ch);
        pos += ch.len_utf8();
    }

    Ok((bindings, residual))
}

/// Identifier: `[A-Za-z_][A-Za-z0-9_.]*` with optional `[digits]` groups
fn scan_identifier(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
            pos += 1;
        } else if c == b'[' {
            let mut end = pos + 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > pos + 1 && bytes.get(end) == Some(&b']') {
                pos = end + 1;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    pos
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    let digits = |mut p: usize| {
        while p < bytes.len() && bytes[p].is_ascii_digit() {
            p += 1;
        }
        p
    };
    pos = digits(pos);
    if bytes.get(pos) == Some(&b'.') {
        pos = digits(pos + 1);
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let end = digits(exp);
        if end > exp {
            pos = end;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn declared(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(
            parse_directive_body("v", "type:float32").unwrap(),
            DirectiveMode::Cast(TargetType::Float32)
        );
        assert_eq!(
            parse_directive_body("d", "byte:2-3").unwrap(),
            DirectiveMode::Slice { start: 2, len: 3 }
        );
        let expected = DirectiveMode::SliceCast {
            start: 0,
            len: 8,
            target: TargetType::Float64,
        };
        assert_eq!(parse_directive_body("d", "byte:0-8,type:float64").unwrap(), expected);
        assert_eq!(parse_directive_body("d", "type:float64, byte:0-8").unwrap(), expected);
    }

    #[test]
    fn test_parse_body_errors() {
        assert!(matches!(
            parse_directive_body("d", "type:float128"),
            Err(CompileError::UnknownTargetType { .. })
        ));
        assert!(matches!(
            parse_directive_body("d", "endian:big"),
            Err(CompileError::UnknownDirectiveKey { .. })
        ));
        assert!(matches!(
            parse_directive_body("d", "byte:0-0"),
            Err(CompileError::InvalidByteRange { .. })
        ));
        assert!(matches!(
            parse_directive_body("d", "byte:0-4,type:float64"),
            Err(CompileError::InvalidByteRange { .. })
        ));
        for bad in ["", "type", "byte:4", "byte:a-4", "byte:-1-4", "type:int8,type:int16"] {
            assert!(parse_directive_body("d", bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_rewrite_identity() {
        let (bindings, residual) = rewrite("speed", &declared(&["speed"])).unwrap();
        assert_eq!(residual, "$0");
        assert_eq!(bindings[0].mode, DirectiveMode::Native);
    }

    #[test]
    fn test_rewrite_shares_placeholder_for_repeated_field() {
        let (bindings, residual) =
            rewrite("a.x * a.x + b[1] / 2.5e-3", &declared(&["a.x", "b[1]"])).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(residual, "$0 * $0 + $1 / 2.5e-3");
    }

    #[test]
    fn test_rewrite_with_directives() {
        let (bindings, residual) = rewrite(
            "data(byte:0-4,type:uint32) - data(byte:0-4,type:uint32)",
            &declared(&["data"]),
        )
        .unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(residual, "$0 - $0");
    }

    #[test]
    fn test_rewrite_errors() {
        let fields = declared(&["data", "speed"]);
        assert!(matches!(
            rewrite("speed + accel", &fields),
            Err(CompileError::UndeclaredField { .. })
        ));
        assert!(matches!(
            rewrite("abs(speed)", &fields),
            Err(CompileError::FunctionCall { .. })
        ));
        assert!(matches!(
            rewrite("data(byte:0-4", &fields),
            Err(CompileError::UnterminatedDirective { .. })
        ));
        assert!(matches!(
            rewrite("data(byte:0-4) + data(type:int32)", &fields),
            Err(CompileError::ConflictingDirectives { .. })
        ));
        assert!(matches!(
            rewrite("data + data(type:int32)", &fields),
            Err(CompileError::ConflictingDirectives { .. })
        ));
        assert!(rewrite("$0 + speed", &fields).is_err());
        assert!(rewrite("__import__", &fields).is_err());
    }

    #[test]
    fn test_apply_slice_cast() {
        let message = FieldValue::structure([(
            "data",
            FieldValue::Bytes(Bytes::from(
                [1u8, 2, 3, 4]
                    .into_iter()
                    .chain(2.5f64.to_le_bytes())
                    .collect::<Vec<u8>>(),
            )),
        )]);
        let directive = FieldDirective::new(
            FieldPath::parse("data").unwrap(),
            DirectiveMode::SliceCast {
                start: 4,
                len: 8,
                target: TargetType::Float64,
            },
        );
        assert_eq!(directive.apply(&message).unwrap(), FieldValue::Float(2.5));
        assert_eq!(directive.byte_start(), Some(4));
        assert_eq!(directive.byte_length(), Some(8));
        assert_eq!(directive.target_type(), Some(TargetType::Float64));
    }
}
