//! Stream descriptors and catalog
//!
//! Every discovered form yields a pair of streams: a paginated list stream
//! producing record summaries (bookmarked by update time) and a detail
//! stream that fetches and normalizes the full record for each summary.
//! Three fixed streams with hand-declared schemas sit alongside them.
//!
//! A stream is plain data here: a descriptor consumed by the generic
//! implementations in `list` and `detail`. Nothing is generated at runtime.

mod detail;
mod fixed;
mod list;

pub use detail::DetailStream;
pub use fixed::{fixed_schema, fixed_streams, FixedStream};
pub use list::ListStream;

use crate::discovery::{Form, FormCache};
use crate::http::KpaClient;
use crate::schema::{JsonSchema, JsonType, SchemaProperty};
use crate::types::{CatalogMode, JsonValue};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Suffix marking the internal list stream of a form pair
pub const RESPONSES_LIST_SUFFIX: &str = "_responses_list";

/// Replication key of form list streams
pub const REPLICATION_KEY: &str = "updated";

// ============================================================================
// Descriptors
// ============================================================================

/// What kind of stream a descriptor names
#[derive(Debug, Clone)]
pub enum StreamKind {
    /// Paginated summaries for one form, bookmarked by `updated`
    FormList {
        /// The form this stream belongs to
        form: Form,
    },
    /// Full normalized records for one form, fed by its list stream
    FormDetail {
        /// The form this stream belongs to
        form: Form,
    },
    /// One of the fixed auxiliary streams
    Fixed(FixedStream),
}

/// A plain-data description of one stream
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Unique stream name
    pub name: String,
    /// Stream kind and its parameters
    pub kind: StreamKind,
}

impl StreamDescriptor {
    /// The list stream of a form pair
    pub fn form_list(form: &Form) -> Self {
        Self {
            name: format!("{}{RESPONSES_LIST_SUFFIX}", form.stream_name()),
            kind: StreamKind::FormList { form: form.clone() },
        }
    }

    /// The detail stream of a form pair
    pub fn form_detail(form: &Form) -> Self {
        Self {
            name: form.stream_name(),
            kind: StreamKind::FormDetail { form: form.clone() },
        }
    }

    /// A fixed auxiliary stream
    pub fn fixed(stream: FixedStream) -> Self {
        Self {
            name: stream.name.to_string(),
            kind: StreamKind::Fixed(stream),
        }
    }

    /// Replication key, for streams that sync incrementally
    pub fn replication_key(&self) -> Option<&'static str> {
        match self.kind {
            StreamKind::FormList { .. } => Some(REPLICATION_KEY),
            _ => None,
        }
    }

    /// Whether this is an internal parent stream hidden from discovery
    pub fn is_parent(&self) -> bool {
        matches!(self.kind, StreamKind::FormList { .. })
    }
}

/// All descriptors for a run: fixed streams first, then one pair per form
/// in discovery order.
pub fn descriptors_for_forms(forms: &[Form]) -> Vec<StreamDescriptor> {
    let mut descriptors: Vec<StreamDescriptor> =
        fixed_streams().iter().copied().map(StreamDescriptor::fixed).collect();
    for form in forms {
        descriptors.push(StreamDescriptor::form_list(form));
        descriptors.push(StreamDescriptor::form_detail(form));
    }
    descriptors
}

/// Declared schema of every form list stream
pub static RESPONSE_LIST_SCHEMA: Lazy<JsonSchema> = Lazy::new(|| {
    let mut schema = JsonSchema::new();
    schema.add_property("id", SchemaProperty::new(JsonType::Integer));
    schema.add_property("created", SchemaProperty::date_time());
    schema.add_property("updated", SchemaProperty::date_time());
    schema
});

// ============================================================================
// Catalog
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

/// Stream entry in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,

    /// Declared JSON schema for the stream's records
    pub json_schema: JsonValue,

    /// Replication key for incremental streams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
}

/// Build the catalog for a set of forms.
///
/// The mode is passed explicitly by the caller: `Discovery` hides the
/// internal `*_responses_list` parent streams, `Sync` includes everything.
/// A form whose field metadata cannot be fetched is skipped (its pair is
/// aborted; other forms are unaffected).
pub async fn build_catalog(
    client: &KpaClient,
    cache: &FormCache,
    forms: &[Form],
    mode: CatalogMode,
) -> Catalog {
    let mut streams: Vec<CatalogStream> = fixed_streams()
        .iter()
        .map(|fixed| CatalogStream {
            name: fixed.name.to_string(),
            json_schema: fixed_schema(fixed.name).to_json(),
            replication_key: None,
        })
        .collect();

    for form in forms {
        let form_schema = match cache.get_or_fetch(client, form).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("Skipping streams for form '{}' ({}): {e}", form.name, form.id);
                continue;
            }
        };

        if mode == CatalogMode::Sync {
            let list = StreamDescriptor::form_list(form);
            streams.push(CatalogStream {
                name: list.name,
                json_schema: RESPONSE_LIST_SCHEMA.to_json(),
                replication_key: Some(REPLICATION_KEY.to_string()),
            });
        }

        streams.push(CatalogStream {
            name: form.stream_name(),
            json_schema: form_schema.schema.to_json(),
            replication_key: None,
        });
    }

    Catalog { streams }
}
