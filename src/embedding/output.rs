//! Shapes a feature-extraction pipeline may hand back, and their conversion
//! into a flat vector.

use serde_json::Value;

use crate::error::{Result, RetrievalError};

/// Raw output of an [`EmbeddingProvider`](super::EmbeddingProvider).
///
/// Conversion priority follows declaration order: a raw tensor buffer is used
/// as-is, a nested list is flattened, a flat list passes through, and anything
/// else is coerced from JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutput {
    /// Contiguous numeric buffer with its tensor shape, e.g. `[1, 1024]`.
    Tensor { data: Vec<f32>, dims: Vec<usize> },
    /// Row-major list form of a 2-D tensor.
    Nested(Vec<Vec<f32>>),
    Flat(Vec<f32>),
    /// Arbitrary JSON, typically the body of a remote endpoint.
    Json(Value),
}

impl EmbeddingOutput {
    /// Flatten into an ordered `Vec<f32>`.
    pub fn into_vector(self) -> Result<Vec<f32>> {
        match self {
            Self::Tensor { data, dims } => {
                let expected: usize = dims.iter().product();
                if !dims.is_empty() && expected != data.len() {
                    tracing::warn!(
                        ?dims,
                        len = data.len(),
                        "tensor buffer length does not match its shape"
                    );
                }
                Ok(data)
            }
            Self::Nested(rows) => Ok(rows.into_iter().flatten().collect()),
            Self::Flat(values) => Ok(values),
            Self::Json(value) => {
                let mut out = Vec::new();
                coerce_json(&value, &mut out)?;
                Ok(out)
            }
        }
    }
}

fn coerce_json(value: &Value, out: &mut Vec<f32>) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                coerce_json(item, out)?;
            }
            Ok(())
        }
        Value::Number(n) => {
            let v = n.as_f64().ok_or_else(|| {
                RetrievalError::EmbeddingShape(format!("number {n} is not representable"))
            })?;
            out.push(v as f32);
            Ok(())
        }
        // Some endpoints wrap the vector, e.g. {"embedding": [...]} or {"data": [...]}.
        Value::Object(map) => match ["data", "embedding", "embeddings"]
            .iter()
            .find_map(|key| map.get(*key))
        {
            Some(inner) => coerce_json(inner, out),
            None => Ok(()),
        },
        Value::Null => Ok(()),
        other => Err(RetrievalError::EmbeddingShape(format!(
            "non-numeric value in embedding: {other}"
        ))),
    }
}

/// Reject degenerate vectors before they reach the index.
pub fn validate_embedding(vector: Vec<f32>) -> Result<Vec<f32>> {
    if vector.len() <= 1 {
        return Err(RetrievalError::InvalidEmbedding {
            dimensions: vector.len(),
        });
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tensor_buffer_is_taken_verbatim() {
        let out = EmbeddingOutput::Tensor {
            data: vec![0.1, 0.2, 0.3, 0.4],
            dims: vec![1, 4],
        };
        assert_eq!(out.into_vector().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn nested_list_is_flattened_in_order() {
        let out = EmbeddingOutput::Nested(vec![vec![1.0, 2.0], vec![3.0]]);
        assert_eq!(out.into_vector().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn json_coercion_handles_nesting_and_wrappers() {
        let nested = EmbeddingOutput::Json(json!([[0.5, -0.5, 1]]));
        assert_eq!(nested.into_vector().unwrap(), vec![0.5, -0.5, 1.0]);

        let wrapped = EmbeddingOutput::Json(json!({"embedding": [0.25, 0.75]}));
        assert_eq!(wrapped.into_vector().unwrap(), vec![0.25, 0.75]);

        let scalar_object = EmbeddingOutput::Json(json!({"unexpected": true}));
        assert!(scalar_object.into_vector().unwrap().is_empty());
    }

    #[test]
    fn json_coercion_rejects_strings() {
        let out = EmbeddingOutput::Json(json!(["0.1", "0.2"]));
        let err = out.into_vector().unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingShape(_)));
    }

    #[test]
    fn short_vectors_are_invalid() {
        for v in [vec![], vec![0.3]] {
            let err = validate_embedding(v).unwrap_err();
            assert!(err.to_string().contains("Invalid embedding generated"));
        }
        assert_eq!(validate_embedding(vec![0.1, 0.2]).unwrap().len(), 2);
    }
}
