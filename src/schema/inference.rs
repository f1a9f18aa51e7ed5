//! Schema inference from form field metadata
//!
//! Every form carries its own field list; the declared record shape of the
//! form's detail stream is derived from that metadata here. The mapping is
//! deterministic: the rule table below is evaluated per field, first match
//! wins.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::discovery::Field;
use crate::types::is_truthy;
use std::collections::{HashMap, HashSet};

/// Fixed metadata field: record identifier
pub const KPA_ID: &str = "kpa_id";
/// Fixed metadata field: record creation time
pub const KPA_CREATED: &str = "kpa_created";
/// Fixed metadata field: record update time
pub const KPA_UPDATED: &str = "kpa_updated";

/// The inferred shape of a form's detail stream
#[derive(Debug, Clone)]
pub struct InferredSchema {
    /// Declared record schema, fixed metadata fields included
    pub schema: JsonSchema,
    /// Field id → resolved display title. Built once per form; titles are
    /// unique within a form, losers of a collision are suffixed with their
    /// field id.
    pub resolution: HashMap<String, String>,
}

/// Infer a form's schema and title resolution from its field metadata.
///
/// Fields are processed in the given order. The first field to claim a
/// stripped title keeps it; any later field with the same title is bound as
/// `{title}_{id}` instead. The three fixed metadata fields are always
/// present and exempt from collision handling.
pub fn infer_schema(fields: &[Field]) -> InferredSchema {
    let mut schema = JsonSchema::new();
    schema.add_property(KPA_ID, SchemaProperty::new(JsonType::Integer));
    schema.add_property(KPA_CREATED, SchemaProperty::date_time());
    schema.add_property(KPA_UPDATED, SchemaProperty::date_time());

    let mut resolution = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();

    for field in fields {
        let title = field.title.trim();
        let resolved = if used.contains(title) {
            format!("{title}_{}", field.id)
        } else {
            title.to_string()
        };
        used.insert(resolved.clone());
        resolution.insert(field.id.clone(), resolved.clone());
        schema.add_property(&resolved, field_property(field));
    }

    InferredSchema { schema, resolution }
}

/// The type rule table, first match wins.
///
/// A `switch` input with a boolean `defaulted` setting is treated as a
/// checkbox; the backend emits both spellings for yes/no fields.
fn field_property(field: &Field) -> SchemaProperty {
    let settings = &field.settings;
    let input_type = settings.get("inputtype").and_then(|v| v.as_str());

    if input_type == Some("checkbox")
        || (input_type == Some("switch")
            && matches!(settings.get("defaulted"), Some(serde_json::Value::Bool(_))))
    {
        return SchemaProperty::new(JsonType::Boolean);
    }

    if settings.get("style").and_then(|v| v.as_str()) == Some("list")
        && settings.get("multiple").is_some_and(is_truthy)
    {
        return SchemaProperty::array(SchemaProperty::new(JsonType::String));
    }

    match field.field_type.as_str() {
        "datetime" => SchemaProperty::date_time(),
        "counter" => SchemaProperty::new(JsonType::Integer),
        "sketch" | "attachments" => {
            SchemaProperty::array(SchemaProperty::union(vec![JsonType::Object, JsonType::String]))
        }
        _ => SchemaProperty::new(JsonType::String),
    }
}
