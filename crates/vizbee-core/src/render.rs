//! Render JSON values as a YAML-style text block.
//!
//! Collections whose members are all scalars stay on one line in flow style
//! (`[a, b]`, `{k: v}`); anything nested is laid out in block style. This is
//! the format the remote API's validation errors are shown in:
//!
//! ```text
//! graph: [invalid value]
//! datasets:
//!   daily-users:
//!   - query: [required field]
//! ```

use std::fmt::Write;

use serde_json::Value;

/// Render `value` as a block. Every line, including the last, ends with `\n`.
pub fn render_block(value: &Value) -> String {
    let mut out = String::new();
    write_block(value, 0, &mut out);
    out
}

fn write_block(value: &Value, indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) if !is_flat(value) => {
            for (key, item) in map {
                if is_flat(item) {
                    let _ = writeln!(out, "{pad}{}: {}", scalar(key), flow(item));
                    continue;
                }
                let _ = writeln!(out, "{pad}{}:", scalar(key));
                match item {
                    // Sequences are not indented under their parent key.
                    Value::Array(_) => write_block(item, indent, out),
                    _ => write_block(item, indent + 2, out),
                }
            }
        }
        Value::Array(items) if !is_flat(value) => {
            for item in items {
                if is_flat(item) {
                    let _ = writeln!(out, "{pad}- {}", flow(item));
                    continue;
                }
                let mut nested = String::new();
                write_block(item, indent + 2, &mut nested);
                let _ = write!(out, "{pad}- {}", nested.trim_start());
            }
        }
        _ => {
            let _ = writeln!(out, "{pad}{}", flow(value));
        }
    }
}

/// A value is flat when it is a scalar or a collection of scalars.
fn is_flat(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(is_scalar),
        Value::Array(items) => items.iter().all(is_scalar),
        _ => true,
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn flow(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => scalar(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(flow).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", scalar(k), flow(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn scalar(s: &str) -> String {
    if s.contains('\n') {
        // serde_json's escaping is valid YAML double-quoted style.
        return Value::String(s.to_string()).to_string();
    }
    if needs_quotes(s) {
        return format!("'{}'", s.replace('\'', "''"));
    }
    s.to_string()
}

fn needs_quotes(s: &str) -> bool {
    const INDICATORS: [char; 19] = [
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];
    s.is_empty()
        || s.trim() != s
        || s.starts_with(INDICATORS)
        || s.contains(": ")
        || s.contains(" #")
        || s.contains([',', '[', ']', '{', '}'])
        || matches!(
            s.to_ascii_lowercase().as_str(),
            "~" | "null" | "true" | "false" | "yes" | "no" | "on" | "off"
        )
        || s.parse::<f64>().is_ok()
}
