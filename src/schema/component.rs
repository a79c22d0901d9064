//! Shape-tolerant component access
//!
//! Probes deliver opaque values: a scalar, or a structured record that may
//! carry a `value` field and/or nested sub-fields the engine inspects by
//! name. Every reader here treats an unexpected shape as absent data rather
//! than a fault.

use serde_json::{Map, Value};

/// The full set of named signal values collected for one fingerprinting
/// pass. Owned by the caller; the engine only reads it (the synthesizer
/// produces derived copies, never in-place mutations).
///
/// `serde_json`'s default map keeps keys sorted, which makes iteration and
/// whole-structure serialization deterministic across processes.
pub type ComponentBag = Map<String, Value>;

/// Look up a nested field on a structured component.
///
/// Returns `None` when the component is not an object, the field is
/// missing, or the field is JSON `null`.
pub fn field<'a>(component: &'a Value, name: &str) -> Option<&'a Value> {
    component
        .as_object()
        .and_then(|map| map.get(name))
        .filter(|v| !v.is_null())
}

/// Read a nested boolean field. Anything other than JSON `true` is `false`.
pub fn field_bool(component: &Value, name: &str) -> bool {
    field(component, name).and_then(Value::as_bool).unwrap_or(false)
}

/// Read a nested string field.
pub fn field_str<'a>(component: &'a Value, name: &str) -> Option<&'a str> {
    field(component, name).and_then(Value::as_str)
}

/// Whether a structured component carries usable data under `name`
/// (present and not `null`).
pub fn has_data(component: &Value, name: &str) -> bool {
    field(component, name).is_some()
}

/// Whether the bag carries a usable value for `key`.
///
/// `null` and the empty string count as absent; everything else, including
/// empty structures, is a real (if weak) signal.
pub fn is_present(bag: &ComponentBag, key: &str) -> bool {
    match bag.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Follow the `value` convention: a structured record exposing a `value`
/// field stands for that field; anything else stands for itself.
pub fn unwrap_value(component: &Value) -> &Value {
    match field(component, "value") {
        Some(inner) => inner,
        None => component,
    }
}

/// Resolve a component to its canonical textual form.
///
/// A structured record with a `value` field resolves to that field's text;
/// other structures serialize whole (key-sorted, so reproducible); scalars
/// resolve to their plain text.
pub fn component_text(component: &Value) -> String {
    match component {
        Value::Object(map) => match map.get("value").filter(|v| !v.is_null()) {
            Some(inner) => scalar_text(inner),
            None => component.to_string(),
        },
        Value::Array(_) => component.to_string(),
        scalar => scalar_text(scalar),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
