//! Flat record transform for tabular sinks
//!
//! CSV-style consumers need one scalar cell per column. [`flatten_record`]
//! turns a nested record into a flat key/value map: nested objects become
//! separator-joined column names, arrays become JSON text, nulls become
//! empty strings. The transform is pure; it never touches the network or
//! the records' order.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Separator used by [`flatten`]
pub const DEFAULT_SEPARATOR: &str = "/";

/// Flatten a record using the default `/` separator
pub fn flatten(record: &Map<String, Value>) -> BTreeMap<String, String> {
    flatten_record(record, DEFAULT_SEPARATOR)
}

/// Flatten a record into sorted `column -> cell` pairs.
///
/// Strings pass through unquoted; numbers and booleans render as their
/// JSON text; arrays are kept whole as JSON text so no rows multiply.
pub fn flatten_record(record: &Map<String, Value>, sep: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    flatten_into(&mut out, "", record, sep);
    out
}

fn flatten_into(
    out: &mut BTreeMap<String, String>,
    prefix: &str,
    map: &Map<String, Value>,
    sep: &str,
) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, sep, key)
        };

        match value {
            Value::Object(nested) => flatten_into(out, &column, nested, sep),
            Value::Null => {
                out.insert(column, String::new());
            }
            Value::String(text) => {
                out.insert(column, text.clone());
            }
            other => {
                out.insert(column, other.to_string());
            }
        }
    }
}
