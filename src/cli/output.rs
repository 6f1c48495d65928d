//! Terminal rendering of command results.

use serde::Serialize;
use serde_json::Value;

/// Print a result as pretty JSON, or as aligned `key  value` lines.
pub(super) fn print_result<T: Serialize>(value: &T, json: bool) -> anyhow::Result<()> {
    let value = serde_json::to_value(value)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    for line in render(&value) {
        println!("{}", line);
    }
    Ok(())
}

fn render(value: &Value) -> Vec<String> {
    let Value::Object(map) = value else {
        return vec![scalar(value)];
    };

    // Find the longest key for alignment
    let width = map.keys().map(String::len).max().unwrap_or(0);
    let mut lines = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                lines.push(format!("  {}:", key));
                for item in items {
                    lines.push(format!("    - {}", inline(item)));
                }
            }
            Value::Object(_) => {
                lines.push(format!("  {}:", key));
                lines.extend(render(value).into_iter().map(|l| format!("  {}", l)));
            }
            _ => lines.push(format!("  {:width$}  {}", key, scalar(value), width = width)),
        }
    }
    lines
}

/// One object on a single line, e.g. `label: Steel, quantity: 4000`.
fn inline(value: &Value) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 => format!("{:.0}", f),
            (None, Some(f)) => format!("{:.2}", f),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
