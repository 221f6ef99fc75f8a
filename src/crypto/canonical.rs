//! Canonical JSON encoding of license records.
//!
//! The signed message is the record document without its `signature` member,
//! encoded with:
//! - object keys in ascending order at every nesting level
//! - no whitespace between tokens
//! - strings escaped the way `JSON.stringify` does: short escapes for quote,
//!   backslash and the five common controls, `\u00xx` for other control
//!   characters, everything else (including non-ASCII) as raw UTF-8
//!
//! The issuer produces its signed message with exactly these rules.

use crate::protocol::models::LicenseRecord;
use serde_json::{Map, Value};

/// Member excluded from the signed payload.
pub const SIGNATURE_FIELD: &str = "signature";

/// Canonical bytes of a record: the message its signature covers.
///
/// Cannot fail: schema violations are rejected when the [`LicenseRecord`] is
/// built (`MalformedRecord`), so every record in hand is encodable.
pub fn canonical_bytes(record: &LicenseRecord) -> Vec<u8> {
    canonical_string(record).into_bytes()
}

/// Canonical form of a record as text.
pub fn canonical_string(record: &LicenseRecord) -> String {
    let mut out = String::new();
    write_object(&mut out, record.document(), Some(SIGNATURE_FIELD));
    out
}

/// Canonical encoding of an arbitrary JSON value.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map, None),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>, skip: Option<&str>) {
    // Map iteration order follows insertion if serde_json's preserve_order
    // feature is enabled anywhere in the build.
    let mut entries: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(key, _)| Some(key.as_str()) != skip)
        .collect();
    // UTF-16 code unit order, as Array.prototype.sort compares strings.
    entries.sort_by(|a, b| a.0.encode_utf16().cmp(b.0.encode_utf16()));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{00}'..='\u{1f}' => out.push_str(&format!("\\u{:04x}", ch as u32)),
            _ => out.push(ch),
        }
    }
    out.push('"');
}
