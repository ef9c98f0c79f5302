//! Read-only commands: show, get, keys.

use appstate::{StateTree, Value};

use crate::output::{OutputFormat, print_table, print_value, summarize};

/// Print the whole tree
pub fn show(tree: &StateTree, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    print_value(&Value::from(tree.root()), format)?;
    Ok(())
}

/// Print the value at `path`
pub fn get(
    tree: &StateTree,
    path: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let value = tree.get(path).into_value();
    print_value(&value, format)?;
    Ok(())
}

/// List the keys of the node at `path` with a summary of each value
pub fn keys(
    tree: &StateTree,
    path: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let node = tree.node(path);
    let entries = node.as_dict();

    match format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("No keys at {}", node.path());
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|(key, value)| {
                    vec![key.clone(), value.type_name().to_string(), summarize(value)]
                })
                .collect();
            print_table(&["KEY", "TYPE", "VALUE"], &rows);
        }
        OutputFormat::Json => {
            let keys: Vec<&String> = entries.keys().collect();
            println!("{}", serde_json::to_string(&keys)?);
        }
    }

    Ok(())
}
