//! Pretty output formatting.

use dynasource_core::source::{item_to_json, Item, ResultEnvelope};

/// Format an item for display, one attribute per line in name order.
pub fn format_item(item: &Item) -> String {
    let mut names: Vec<&String> = item.keys().collect();
    names.sort();

    names
        .into_iter()
        .map(|name| format!("  {}: {}", name, item[name].to_json()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an envelope for display.
pub fn format_envelope(envelope: &ResultEnvelope) -> String {
    if envelope.is_empty() {
        return "No records found.".to_string();
    }

    let mut output = format!("RECORDS ({})\n", envelope.len());
    output.push_str(&"-".repeat(40));
    for item in &envelope.items {
        output.push_str(&format!("\n{}", format_item(item)));
        output.push('\n');
    }

    match &envelope.last_evaluated_key {
        Some(key) => output.push_str(&format!("\nLast evaluated key: {}", item_to_json(key))),
        None => output.push_str("\nNo more records."),
    }
    output
}
