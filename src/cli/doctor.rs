//! CLI `doctor` command — check configuration, model files, and the index.

use anyhow::Result;

use findings::config::{default_config_path, FindingsConfig};
use findings::index::PineconeClient;

/// Print a health report. Problems are reported, not returned as errors.
pub async fn doctor(config: &FindingsConfig) -> Result<()> {
    println!("Findings Health Report");
    println!("======================");
    println!();
    println!("Config file:       {}", default_config_path().display());
    println!();

    let emb = &config.embedding;
    println!("Embedding:");
    println!("  Provider:        {}", emb.provider);
    println!("  Model:           {}@{}", emb.model, emb.revision);
    println!("  Pooling:         {} (normalize: {})", emb.pooling, emb.normalize);
    match emb.provider.as_str() {
        "local" => {
            let model_dir = emb.model_dir();
            let model_ok = model_dir.join(emb.onnx_file_name()).exists();
            let tokenizer_ok = model_dir.join("tokenizer.json").exists();
            println!("  Model dir:       {}", model_dir.display());
            println!("  {:<17}{}", format!("{}:", emb.onnx_file_name()), status(model_ok));
            println!("  tokenizer.json:  {}", status(tokenizer_ok));
            if !(model_ok && tokenizer_ok) {
                println!("  Run `findings model download` to fetch the model.");
            }
        }
        "remote" => {
            let endpoint = if emb.endpoint.is_empty() {
                "(not set)"
            } else {
                emb.endpoint.as_str()
            };
            println!("  Endpoint:        {endpoint}");
        }
        other => println!("  WARNING: unknown provider '{other}'"),
    }
    println!();

    let idx = &config.index;
    println!("Index:");
    println!(
        "  Name:            {}",
        if idx.index_name.is_empty() { "(not set)" } else { idx.index_name.as_str() }
    );
    println!(
        "  Namespace:       {}",
        if idx.namespace.is_empty() { "(default)" } else { idx.namespace.as_str() }
    );
    println!(
        "  API key:         {}",
        if idx.api_key.is_empty() { "MISSING" } else { "set" }
    );

    if idx.api_key.is_empty() || idx.index_name.is_empty() {
        println!();
        println!("Set PINECONE_API_KEY and PINECONE_INDEX_NAME (or [index] in the config file).");
        return Ok(());
    }

    let client = PineconeClient::new(idx)?;
    match client.index(&idx.index_name).describe().await {
        Ok(description) => {
            println!("  Status:          reachable");
            if let Some(host) = &description.host {
                println!("  Host:            {host}");
            }
            if let Some(metric) = &description.metric {
                println!("  Metric:          {metric}");
            }
            if let Some(dimension) = description.dimension {
                println!("  Dimension:       {dimension}");
            }
        }
        Err(e) => println!("  Status:          UNREACHABLE ({e})"),
    }
    println!();
    println!(
        "Default top_k:     {} (label: \"{}\")",
        config.retrieval.top_k, config.retrieval.finding_label
    );

    Ok(())
}

fn status(ok: bool) -> &'static str {
    if ok {
        "present"
    } else {
        "missing"
    }
}
