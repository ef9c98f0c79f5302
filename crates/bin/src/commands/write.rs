//! Commands that modify the snapshot: set, delete.

use appstate::{StateTree, Value};

use crate::output::OutputFormat;

/// Parse `raw` as JSON, falling back to plain text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

/// Store `raw` at `path`
pub fn set(
    tree: &StateTree,
    path: &str,
    raw: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = parse_value(raw);
    tree.set(path, value.clone())?;
    tracing::debug!(path, "Stored value");

    match format {
        OutputFormat::Human => println!("Set {path}"),
        OutputFormat::Json => {
            let out = serde_json::json!({ "path": path, "value": serde_json::Value::from(value) });
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}

/// Delete the value at `path`
pub fn delete(
    tree: &StateTree,
    path: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let removed = tree.delete(path)?;

    match format {
        OutputFormat::Human => println!("Deleted {path}"),
        OutputFormat::Json => {
            let out =
                serde_json::json!({ "path": path, "removed": serde_json::Value::from(removed) });
            println!("{}", serde_json::to_string(&out)?);
        }
    }
    Ok(())
}
