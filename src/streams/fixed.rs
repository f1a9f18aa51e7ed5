//! Fixed auxiliary streams
//!
//! Three list endpoints with static, hand-declared schemas: roles, users,
//! and lines of business. No inference and no bookmarks; they are synced in
//! full on every run.

use crate::schema::{JsonSchema, JsonType, SchemaProperty};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// One fixed stream: endpoint plus the body key the records sit under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStream {
    /// Stream name
    pub name: &'static str,
    /// Endpoint path
    pub path: &'static str,
    /// Response body key holding the record array
    pub records_key: &'static str,
}

const ROLES: FixedStream = FixedStream {
    name: "roles",
    path: "/roles.list",
    records_key: "roles",
};

const USERS: FixedStream = FixedStream {
    name: "users",
    path: "/users.list",
    records_key: "users",
};

const LINES_OF_BUSINESS: FixedStream = FixedStream {
    name: "lines_of_business",
    path: "/linesofbusiness.list",
    records_key: "linesofbusiness",
};

/// All fixed streams, in sync order
pub fn fixed_streams() -> &'static [FixedStream] {
    &[ROLES, USERS, LINES_OF_BUSINESS]
}

/// The declared schema of a fixed stream
pub fn fixed_schema(name: &str) -> &'static JsonSchema {
    match name {
        "users" => &USERS_SCHEMA,
        "lines_of_business" => &LINES_OF_BUSINESS_SCHEMA,
        _ => &ROLES_SCHEMA,
    }
}

fn string() -> SchemaProperty {
    SchemaProperty::new(JsonType::String)
}

fn integer() -> SchemaProperty {
    SchemaProperty::new(JsonType::Integer)
}

fn string_array() -> SchemaProperty {
    SchemaProperty::array(string())
}

static ROLES_SCHEMA: Lazy<JsonSchema> = Lazy::new(|| {
    let mut schema = JsonSchema::new();
    schema.add_property("id", string());
    schema.add_property("name", string());
    schema
});

static USERS_SCHEMA: Lazy<JsonSchema> = Lazy::new(|| {
    let mut schema = JsonSchema::new();
    schema.add_property("created", integer());
    schema.add_property("registered_on", integer());
    schema.add_property("supervisor_id", string());
    schema.add_property("mentor_id", string());
    schema.add_property("hse_id", string());
    schema.add_property("manager_id", string());
    schema.add_property("clients_id", string_array());
    schema.add_property("firstname", string());
    schema.add_property("lastname", string());
    schema.add_property("employeeNumber", string());
    schema.add_property("email", string().with_format("email"));
    schema.add_property("username", string());
    schema.add_property("cellPhone", string());
    schema.add_property("hireDate", integer());
    schema.add_property("sseDate", integer());
    schema.add_property("terminationDate", integer());
    schema.add_property("emergencyContact", string());
    schema.add_property("isDriver", SchemaProperty::new(JsonType::Boolean));
    schema.add_property("isRegulatedDriver", SchemaProperty::new(JsonType::Boolean));
    schema.add_property("role_id", string());
    schema.add_property(
        "metavalues",
        SchemaProperty::map_of(SchemaProperty::union(vec![
            JsonType::Object,
            JsonType::String,
        ])),
    );
    schema.add_property(
        "creator_id",
        SchemaProperty::object(BTreeMap::from([
            ("firstname".to_string(), string()),
            ("lastname".to_string(), string()),
            ("id".to_string(), string()),
        ])),
    );
    schema.add_property("fieldOffice_id", string_array());
    schema.add_property("lineOfBusiness_id", string_array());
    schema.add_property("lastWebAccess", integer());
    schema.add_property("lastMobileAccess", integer());
    schema.add_property("id", string());
    schema
});

static LINES_OF_BUSINESS_SCHEMA: Lazy<JsonSchema> = Lazy::new(|| {
    let mut schema = JsonSchema::new();
    schema.add_property("name", string());
    schema.add_property("code", string());
    schema.add_property("created", integer());
    schema.add_property("id", string());
    schema
});
