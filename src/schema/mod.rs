//! Stream schemas
//!
//! JSON-schema model plus the inference engine that turns a form's field
//! metadata into the declared shape of its detail stream.

mod inference;
mod types;

pub use inference::{infer_schema, InferredSchema, KPA_CREATED, KPA_ID, KPA_UPDATED};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
