//! CLI `query` command — run one retrieval and print the formatted findings.

use anyhow::{Context, Result};

use findings::config::FindingsConfig;
use findings::retrieval::{QueryOverrides, Retriever};

pub async fn query(config: &FindingsConfig, text: &str, overrides: &QueryOverrides) -> Result<()> {
    let retriever =
        Retriever::from_config(config).context("failed to set up vector index client")?;

    let answer = retriever.retrieve(text, overrides).await;
    println!("{answer}");

    Ok(())
}
