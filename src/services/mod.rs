// src/services/mod.rs

//! Source adapters for the two upstream APIs.

mod listings;
mod schools;

pub use listings::ListingClient;
pub use schools::{SchoolsClient, SchoolsOutcome};

use serde_json::Value;

/// Flatten a JSON object payload into wire-ready key/value pairs.
///
/// String values go through verbatim; everything else uses its JSON
/// rendering. Pair order follows the canonical (sorted) key order.
pub(crate) fn form_pairs(payload: &Value) -> Vec<(String, String)> {
    match payload.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect(),
        None => Vec::new(),
    }
}
