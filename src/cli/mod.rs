pub mod doctor;
pub mod query;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use findings::config::EmbeddingConfig;

const HF_BASE_URL: &str = "https://huggingface.co";

fn model_url(config: &EmbeddingConfig) -> String {
    format!(
        "{HF_BASE_URL}/{}/resolve/{}/onnx/{}",
        config.model,
        config.revision,
        config.onnx_file_name()
    )
}

fn tokenizer_url(config: &EmbeddingConfig) -> String {
    format!(
        "{HF_BASE_URL}/{}/resolve/{}/tokenizer.json",
        config.model, config.revision
    )
}

/// Download the ONNX embedding model and tokenizer to the cache directory.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    if config.provider != "local" {
        println!(
            "Embedding provider is '{}'; nothing to download.",
            config.provider
        );
        return Ok(());
    }

    let model_dir = config.model_dir();
    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("failed to create cache dir: {}", model_dir.display()))?;

    let model_path = model_dir.join(config.onnx_file_name());
    let tokenizer_path = model_dir.join("tokenizer.json");

    if model_path.exists() {
        println!("Model already exists at {}", model_path.display());
    } else {
        println!(
            "Downloading {} ({}@{})...",
            config.onnx_file_name(),
            config.model,
            config.revision
        );
        download_file(&model_url(config), &model_path).await?;
        println!("Model saved to {}", model_path.display());
    }

    if tokenizer_path.exists() {
        println!("Tokenizer already exists at {}", tokenizer_path.display());
    } else {
        println!("Downloading tokenizer.json...");
        download_file(&tokenizer_url(config), &tokenizer_path).await?;
        println!("Tokenizer saved to {}", tokenizer_path.display());
    }

    println!("Model download complete. Ready for use.");
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk)
            .await
            .context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
