//! Output formatting functions.

pub mod json;
pub mod pretty;

use dynasource_core::source::{item_to_json, Item, ResultEnvelope};

use crate::cli::OutputFormat;

/// Format an item for output.
pub fn format_item(item: &Item, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(&item_to_json(item)),
        OutputFormat::Typed => json::format_json(item),
        OutputFormat::Pretty => pretty::format_item(item),
    }
}

/// Format an envelope for output.
pub fn format_envelope(envelope: &ResultEnvelope, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(&json::envelope_to_json(envelope)),
        OutputFormat::Typed => json::format_json(envelope),
        OutputFormat::Pretty => pretty::format_envelope(envelope),
    }
}

/// Format the outcome of a write.
pub fn format_write(ok: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Typed => json::format_json(&ok),
        OutputFormat::Pretty if ok => "Updated.".to_string(),
        OutputFormat::Pretty => "Not updated.".to_string(),
    }
}
