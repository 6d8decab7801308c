//! Conversion between a panel collection and its persisted form.
//!
//! Serializing is a plain structural encoding. Deserializing never fails:
//! unreadable documents become an empty layout, and individual panels that
//! are malformed are dropped with a warning. Non-strict decoding also drops
//! duplicated ids and panels whose view module is no longer registered.

use std::collections::HashSet;

use serde::Serialize;

use crate::registry::ViewModuleRegistry;
use crate::types::PanelInstance;

// ---------------------------------------------------------------------------
// Module catalog
// ---------------------------------------------------------------------------

/// Answers whether a view module key is currently available.
pub trait ModuleCatalog {
    fn has_module(&self, key: &str) -> bool;
}

impl ModuleCatalog for ViewModuleRegistry {
    fn has_module(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl<S: AsRef<str>> ModuleCatalog for [S] {
    fn has_module(&self, key: &str) -> bool {
        self.iter().any(|k| k.as_ref() == key)
    }
}

// ---------------------------------------------------------------------------
// Serialize
// ---------------------------------------------------------------------------

/// Encode panels as a JSON array string, preserving order.
pub fn serialize(panels: &[PanelInstance]) -> String {
    match serde_json::to_string(panels) {
        Ok(text) => text,
        Err(e) => {
            // Only reachable with non-finite coordinates, which JSON cannot hold.
            tracing::error!(error = %e, "Failed to serialize layout; persisting empty layout");
            "[]".to_string()
        }
    }
}

/// Encode panels as an inline JSON array value.
pub fn to_value(panels: &[PanelInstance]) -> serde_json::Value {
    serde_json::to_value(panels).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode layout; using empty layout");
        serde_json::Value::Array(Vec::new())
    })
}

// ---------------------------------------------------------------------------
// Deserialize
// ---------------------------------------------------------------------------

/// Why a persisted panel was left out of a decoded layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DropReason {
    /// Element is not a well-formed panel object.
    MalformedShape(String),
    /// `viewModule` is not in the catalog (non-strict mode only).
    UnknownModule(String),
    /// An earlier panel already used this id (non-strict mode only).
    DuplicateId(String),
}

/// A dropped element together with its index in the persisted array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedPanel {
    pub index: usize,
    pub reason: DropReason,
}

/// Result of decoding a persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodedLayout {
    pub panels: Vec<PanelInstance>,
    pub dropped: Vec<DroppedPanel>,
    /// `false` when the document itself was unreadable or not an array.
    pub document_valid: bool,
}

/// Decode a serialized layout, filtering against `catalog` unless `strict`.
pub fn deserialize<C>(text: &str, catalog: &C, strict: bool) -> Vec<PanelInstance>
where
    C: ModuleCatalog + ?Sized,
{
    decode(text, catalog, strict).panels
}

/// Decode a stored `layout_json` column.
///
/// Accepts either the array itself or a JSON string holding the serialized
/// array, since `layout_json` is stored both ways.
pub fn deserialize_value<C>(value: &serde_json::Value, catalog: &C, strict: bool) -> Vec<PanelInstance>
where
    C: ModuleCatalog + ?Sized,
{
    decode_stored(value, catalog, strict).panels
}

/// Like [`deserialize`], but also reports what was dropped and why.
pub fn decode<C>(text: &str, catalog: &C, strict: bool) -> DecodedLayout
where
    C: ModuleCatalog + ?Sized,
{
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => decode_value(&value, catalog, strict),
        Err(e) => {
            tracing::warn!(error = %e, "Persisted layout is not valid JSON; using empty layout");
            DecodedLayout::default()
        }
    }
}

/// Like [`deserialize_value`], but also reports what was dropped and why.
pub fn decode_stored<C>(value: &serde_json::Value, catalog: &C, strict: bool) -> DecodedLayout
where
    C: ModuleCatalog + ?Sized,
{
    match value {
        serde_json::Value::String(text) => decode(text, catalog, strict),
        other => decode_value(other, catalog, strict),
    }
}

/// Decode a parsed layout document. Anything but an array is an empty layout.
///
/// In strict mode panels are returned as persisted: unknown modules,
/// duplicate ids and out-of-range sizes are all kept.
pub fn decode_value<C>(value: &serde_json::Value, catalog: &C, strict: bool) -> DecodedLayout
where
    C: ModuleCatalog + ?Sized,
{
    let elements = match value {
        serde_json::Value::Array(elements) => elements,
        other => {
            tracing::warn!(
                kind = json_kind(other),
                "Persisted layout is not an array; using empty layout",
            );
            return DecodedLayout::default();
        }
    };

    let mut decoded = DecodedLayout {
        panels: Vec::with_capacity(elements.len()),
        dropped: Vec::new(),
        document_valid: true,
    };
    let mut seen_ids = HashSet::new();

    for (index, element) in elements.iter().enumerate() {
        let mut panel = match serde_json::from_value::<PanelInstance>(element.clone()) {
            Ok(panel) => panel,
            Err(e) => {
                decoded.dropped.push(DroppedPanel {
                    index,
                    reason: DropReason::MalformedShape(e.to_string()),
                });
                continue;
            }
        };

        if !strict && !panel.is_empty_slot() && !catalog.has_module(&panel.view_module) {
            decoded.dropped.push(DroppedPanel {
                index,
                reason: DropReason::UnknownModule(panel.view_module),
            });
            continue;
        }

        if !strict && !seen_ids.insert(panel.id.clone()) {
            decoded.dropped.push(DroppedPanel {
                index,
                reason: DropReason::DuplicateId(panel.id),
            });
            continue;
        }

        if !strict {
            panel.size = panel.size.clamped();
        }
        decoded.panels.push(panel);
    }

    if !decoded.dropped.is_empty() {
        tracing::warn!(
            kept = decoded.panels.len(),
            dropped = decoded.dropped.len(),
            strict,
            "Dropped panels while loading persisted layout",
        );
    }

    decoded
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
