//! Key-case translation between the store's snake_case columns and the
//! camelCase JSON used on the wire.

use serde_json::{Map, Value};

pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            // Leading underscores are kept verbatim.
            if out.chars().all(|o| o == '_') {
                out.push(c);
            } else {
                upper_next = true;
            }
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Recursively rewrite object keys to camelCase. Values are untouched.
pub fn camelize_keys(value: Value) -> Value {
    rewrite_keys(value, &to_camel_case)
}

/// Recursively rewrite object keys to snake_case. Values are untouched.
pub fn decamelize_keys(value: Value) -> Value {
    rewrite_keys(value, &to_snake_case)
}

fn rewrite_keys(value: Value, f: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (f(&k), rewrite_keys(v, f)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| rewrite_keys(v, f)).collect()),
        other => other,
    }
}
