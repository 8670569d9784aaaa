//! JSON → FieldValue 转换
//!
//! 字节数组有两种写法：
//! - `{"$bytes": [1, 2, 255]}`：内联字节
//! - `{"$file": "frames/000001.bin"}`：相对 JSONL 所在目录的二进制文件

use std::collections::BTreeMap;
use std::path::{Component, Path};

use bytes::Bytes;
use contracts::FieldValue;
use serde_json::Value;

const BYTES_MARKER: &str = "$bytes";
const FILE_MARKER: &str = "$file";

/// 将解码后的 JSON 值转换为消息字段树
pub fn json_to_field(value: Value, base_dir: &Path) -> Result<FieldValue, String> {
    Ok(match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                FieldValue::UInt(u)
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| format!("unrepresentable number {n}"))?;
                FieldValue::Float(f)
            }
        }
        Value::String(s) => FieldValue::String(s),
        Value::Array(items) => FieldValue::Sequence(
            items
                .into_iter()
                .map(|item| json_to_field(item, base_dir))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(inline) = map.get(BYTES_MARKER) {
                    return inline_bytes(inline).map(FieldValue::Bytes);
                }
                if let Some(file) = map.get(FILE_MARKER) {
                    return sidecar_bytes(file, base_dir).map(FieldValue::Bytes);
                }
            }
            let mut fields = BTreeMap::new();
            for (name, value) in map {
                fields.insert(name, json_to_field(value, base_dir)?);
            }
            FieldValue::Struct(fields)
        }
    })
}

fn inline_bytes(value: &Value) -> Result<Bytes, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("{BYTES_MARKER} must be an array of bytes"))?;
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| format!("{BYTES_MARKER} element {item} is not a byte"))
        })
        .collect::<Result<Vec<u8>, _>>()
        .map(Bytes::from)
}

fn sidecar_bytes(value: &Value, base_dir: &Path) -> Result<Bytes, String> {
    let relative = value
        .as_str()
        .ok_or_else(|| format!("{FILE_MARKER} must be a relative path string"))?;
    // 只允许日志目录之内的相对路径
    let escapes = Path::new(relative)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.is_empty() || escapes {
        return Err(format!(
            "{FILE_MARKER} path '{relative}' must stay inside the log directory"
        ));
    }
    let path = base_dir.join(relative);
    std::fs::read(&path)
        .map(Bytes::from)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))
}
