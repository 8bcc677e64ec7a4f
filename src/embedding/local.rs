//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] for BERT-style sentence-embedding models
//! exported to ONNX (mxbai-embed-large-v1 by default). Handles tokenization,
//! inference, pooling, and optional L2 normalization.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{ArrayView3, Axis};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{EmbeddingOutput, EmbeddingProvider, ExtractOptions, Pooling};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for BERT-large style encoders.
const MAX_SEQ_LEN: usize = 512;

/// Local ONNX-based embedding provider.
pub struct LocalEmbeddingProvider {
    model: Arc<OnnxModel>,
    model_id: String,
}

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for OnnxModel {}
unsafe impl Sync for OnnxModel {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_dir = config.model_dir();
        let model_path = model_dir.join(config.onnx_file_name());
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `findings model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `findings model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;

        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(None);

        tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
            }),
            model_id: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn extract(&self, text: &str, options: &ExtractOptions) -> Result<EmbeddingOutput> {
        // Inference is CPU-bound; keep it off the async workers.
        let model = Arc::clone(&self.model);
        let text = text.to_string();
        let options = *options;
        tokio::task::spawn_blocking(move || model.run(&text, &options))
            .await
            .context("embedding task failed")?
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl OnnxModel {
    fn run(&self, text: &str, options: &ExtractOptions) -> Result<EmbeddingOutput> {
        // Step 1: Tokenize
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let seq_len = encoding.get_ids().len();
        anyhow::ensure!(seq_len > 0, "tokenizer produced no tokens");

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        // token_type_ids: all zeros (single sentence, no segment B)
        let token_type_ids = vec![0i64; seq_len];

        let shape = vec![1i64, seq_len as i64];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))?;
        let token_type_ids_tensor =
            Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        // Step 2: Run ONNX inference
        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        // Step 3: Extract token embeddings, shape [1, seq_len, hidden].
        // The output name varies by ONNX export. Try common names, fall back to index 0.
        let token_emb_value = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .unwrap_or_else(|| &outputs[0]);

        let (shape, data) = token_emb_value
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1,
            "unexpected token embeddings shape: {dims:?}, expected [1, seq, hidden]"
        );
        let actual_seq_len = dims[1] as usize;
        let hidden_dim = dims[2] as usize;

        let token_embeddings = ArrayView3::from_shape((1, actual_seq_len, hidden_dim), data)
            .context("token embeddings buffer does not match its shape")?;

        // Step 4: Pool
        let mask: Vec<f32> = attention_mask.iter().map(|&m| m as f32).collect();
        let pooled = pool(&token_embeddings, &mask, options.pooling);

        // Step 5: Optionally L2 normalize
        let data = if options.normalize {
            l2_normalize(&pooled)
        } else {
            pooled
        };

        Ok(EmbeddingOutput::Tensor {
            dims: vec![1, data.len()],
            data,
        })
    }
}

/// Collapse `[1, seq, hidden]` token embeddings into a single `hidden`-length vector.
fn pool(token_embeddings: &ArrayView3<'_, f32>, mask: &[f32], pooling: Pooling) -> Vec<f32> {
    let tokens = token_embeddings.index_axis(Axis(0), 0);
    match pooling {
        Pooling::Cls => tokens.row(0).to_vec(),
        Pooling::Mean => {
            let hidden_dim = tokens.ncols();
            let mut sum = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;

            for (s, row) in tokens.rows().into_iter().enumerate() {
                let m = mask.get(s).copied().unwrap_or(0.0);
                if m > 0.0 {
                    for (acc, x) in sum.iter_mut().zip(row.iter()) {
                        *acc += x * m;
                    }
                    count += m;
                }
            }

            if count > 0.0 {
                for x in &mut sum {
                    *x /= count;
                }
            }
            sum
        }
    }
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
