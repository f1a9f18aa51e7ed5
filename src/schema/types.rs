//! Schema types
//!
//! A deliberately small JSON Schema model: single or union types, an
//! optional format hint, array items, and nested object properties. That is
//! all the KPA stream vocabulary needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum JsonType {
    String,
    Integer,
    Boolean,
    Object,
    Array,
}

/// JSON type can be a single type or a union (e.g. `["object", "string"]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    /// One type
    Single(JsonType),
    /// A union of types
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// The primary type: the single type, or the first member of a union
    pub fn primary_type(&self) -> Option<JsonType> {
        match self {
            JsonTypeOrArray::Single(t) => Some(*t),
            JsonTypeOrArray::Multiple(types) => types.first().copied(),
        }
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Property type(s)
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// Format hint (e.g. "date-time", "email")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Array items schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,

    /// Nested properties (for objects)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Schema for additional properties (for open objects)
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Create a new property with the given type
    pub fn new(json_type: JsonType) -> Self {
        Self {
            json_type: JsonTypeOrArray::Single(json_type),
            format: None,
            items: None,
            properties: None,
            additional_properties: None,
        }
    }

    /// Create a property with a union of types
    pub fn union(types: Vec<JsonType>) -> Self {
        Self {
            json_type: JsonTypeOrArray::Multiple(types),
            format: None,
            items: None,
            properties: None,
            additional_properties: None,
        }
    }

    /// Create an array property with an item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(JsonType::Array)
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::new(JsonType::Object)
        }
    }

    /// Create an open object whose values all match one schema
    pub fn map_of(values: SchemaProperty) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::new(JsonType::Object)
        }
    }

    /// A string property carrying the date-time format hint
    pub fn date_time() -> Self {
        Self::new(JsonType::String).with_format("date-time")
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Whether the declared primary type is `string`.
    ///
    /// Date-time properties are string-typed too; they only add a format.
    pub fn is_string_typed(&self) -> bool {
        self.json_type.primary_type() == Some(JsonType::String)
    }
}

/// An object schema: the declared shape of one stream's records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Always "object" at the top level
    #[serde(rename = "type")]
    pub json_type: JsonType,

    /// Object properties
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Create a new empty object schema
    pub fn new() -> Self {
        Self {
            json_type: JsonType::Object,
            properties: BTreeMap::new(),
        }
    }

    /// Add a property
    pub fn add_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties.insert(name.to_string(), property);
    }

    /// Get a property
    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
