mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use findings::config::FindingsConfig;

#[derive(Parser)]
#[command(name = "findings", version, about = "Retrieve clinical findings from a Pinecone index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a query and print the formatted findings
    Query {
        /// Natural-language query text
        text: String,
        /// Index name (defaults to index.index_name)
        #[arg(long)]
        index: Option<String>,
        /// Namespace within the index (defaults to index.namespace)
        #[arg(long)]
        namespace: Option<String>,
        /// Number of matches to request (defaults to retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Start the MCP server
    Serve {
        /// Transport: "stdio" or "http" (defaults to server.transport)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Check configuration, model files, and index reachability
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the configured embedding model to the cache directory
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = FindingsConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and query output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Query {
            text,
            index,
            namespace,
            top_k,
        } => {
            let overrides = findings::retrieval::QueryOverrides {
                index_name: index,
                namespace,
                top_k,
            };
            cli::query::query(&config, &text, &overrides).await?;
        }
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "http" => server::serve_http(config).await?,
                other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
            }
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Doctor => {
            cli::doctor::doctor(&config).await?;
        }
    }

    Ok(())
}
