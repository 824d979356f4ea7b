//! Gemini response schemas
//!
//! Built from the same field descriptors the pipeline validates against, so
//! the schema the model is asked to follow and the shape that is accepted
//! cannot drift apart. Gemini uses the OpenAPI subset with uppercase type
//! names.

use deal_sim_core::{FieldKind, FieldSpec, CLAUSE_FIELDS, RISK_FIELDS};
use serde_json::{json, Map, Value};

/// Array-of-objects schema for the given record fields
pub fn response_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::with_capacity(fields.len());

    for field in fields {
        properties.insert(field.name.to_string(), property(field.kind));
        required.push(Value::String(field.name.to_string()));
    }

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": required,
        }
    })
}

fn property(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => json!({ "type": "STRING" }),
        FieldKind::TextList => json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        FieldKind::OneOf(values) => json!({ "type": "STRING", "enum": values }),
    }
}

pub fn clause_schema() -> Value {
    response_schema(CLAUSE_FIELDS)
}

pub fn risk_schema() -> Value {
    response_schema(RISK_FIELDS)
}
