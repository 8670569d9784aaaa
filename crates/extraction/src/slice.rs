//! Byte range extraction

use bytes::Bytes;
use contracts::{FieldValue, SampleError};

/// Slice `[start, start + len)` out of a byte-carrying field
///
/// `Bytes` values are sliced without copying. Sequences of small integers,
/// which is how `uint8[]` arrays arrive from decoded logs, are packed first.
///
/// # Errors
/// - `SampleError::Cast` if the value does not carry bytes
/// - `SampleError::ByteRange` if the range exceeds the buffer
pub fn extract_bytes(
    path: &str,
    value: &FieldValue,
    start: usize,
    len: usize,
) -> Result<Bytes, SampleError> {
    let buffer = match value {
        FieldValue::Bytes(data) => data.clone(),
        FieldValue::Sequence(items) => pack_sequence(path, items)?,
        other => {
            return Err(SampleError::cast(
                path,
                "bytes",
                format!("{} value has no byte representation", other.type_name()),
            ))
        }
    };

    let end = start.saturating_add(len);
    if end > buffer.len() {
        return Err(SampleError::ByteRange {
            path: path.to_string(),
            start,
            end,
            len: buffer.len(),
        });
    }

    Ok(buffer.slice(start..end))
}

fn pack_sequence(path: &str, items: &[FieldValue]) -> Result<Bytes, SampleError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let byte = match item {
                FieldValue::Int(v) => u8::try_from(*v).ok(),
                FieldValue::UInt(v) => u8::try_from(*v).ok(),
                _ => None,
            };
            byte.ok_or_else(|| {
                SampleError::cast(
                    path,
                    "bytes",
                    format!("element {i} ({item}) is not a byte"),
                )
            })
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(Bytes::from)
}
