//! Typed view over the loosely-specified match objects a vector index returns.

use serde_json::{Map, Value};

/// Candidate field names for a match identifier, in priority order.
pub const ID_FIELDS: &[&str] = &["_id", "id", "documentId"];

/// Candidate field names for a match score, in priority order.
pub const SCORE_FIELDS: &[&str] = &["_score", "score", "similarity", "distance"];

/// Outcome of probing an object for one of several field names.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldProbe<'a> {
    Found { field: &'a str, value: &'a Value },
    NotFound,
}

impl std::fmt::Display for FieldProbe<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found {
                value: Value::String(s),
                ..
            } => f.write_str(s),
            Self::Found { value, .. } => write!(f, "{value}"),
            Self::NotFound => f.write_str("Not found"),
        }
    }
}

/// Return the first candidate present on `object`. `null` counts as absent.
pub fn probe_field<'a>(object: &'a Map<String, Value>, candidates: &[&'a str]) -> FieldProbe<'a> {
    candidates
        .iter()
        .find_map(|&field| match object.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some(FieldProbe::Found { field, value }),
        })
        .unwrap_or(FieldProbe::NotFound)
}

/// One nearest-neighbour result.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: Option<String>,
    pub score: Option<f64>,
    pub metadata: Map<String, Value>,
    raw: Map<String, Value>,
}

impl Match {
    /// Build a match from a raw JSON object, probing id and score fields.
    ///
    /// Non-object values become an empty match rather than an error.
    pub fn from_value(value: Value) -> Self {
        let raw = match value {
            Value::Object(map) => map,
            other => {
                tracing::warn!(value = %other, "match is not a JSON object");
                Map::new()
            }
        };

        let id = match probe_field(&raw, ID_FIELDS) {
            FieldProbe::Found {
                value: Value::String(s),
                ..
            } => Some(s.clone()),
            FieldProbe::Found { value, .. } => Some(value.to_string()),
            FieldProbe::NotFound => None,
        };
        let score = match probe_field(&raw, SCORE_FIELDS) {
            FieldProbe::Found { value, .. } => value.as_f64(),
            FieldProbe::NotFound => None,
        };
        let metadata = match raw.get("metadata") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        Self {
            id,
            score,
            metadata,
            raw,
        }
    }

    /// The source passage stored under `metadata.chunk`, if it is text.
    pub fn chunk(&self) -> Option<&str> {
        self.metadata.get("chunk").and_then(Value::as_str)
    }

    pub fn probe_id(&self) -> FieldProbe<'_> {
        probe_field(&self.raw, ID_FIELDS)
    }

    pub fn probe_score(&self) -> FieldProbe<'_> {
        probe_field(&self.raw, SCORE_FIELDS)
    }
}
