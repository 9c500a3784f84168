use anyhow::{Context, Result};
use catalog_search::api::Operation;
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "catalog-search-cli")]
#[command(about = "Catalog Search CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CATALOG_SEARCH_URL", default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-index the server's product catalog
    Index,

    /// Index documents from a JSON array file
    IndexDocs {
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Delete the keyword index
    DeleteIndex,

    /// Embed the catalog into both vector indices
    Vectorize,

    /// Delete both vector indices
    DeleteVectorize,

    /// Request a presigned image upload URL
    Presign {
        #[arg(value_name = "FILENAME")]
        filename: String,

        #[arg(short, long)]
        content_type: Option<String>,
    },

    /// Run a search request given inline or as @file
    Search {
        #[arg(value_name = "JSON")]
        request: String,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    let (operation, body) = match cli.command {
        Commands::Health => {
            let response = client.get(format!("{}/health", cli.endpoint)).send().await?;
            let body: Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            return Ok(());
        }
        Commands::Index => (Operation::Index, json!({})),
        Commands::IndexDocs { file } => (Operation::IndexCustomDocument, read_json(&format!("@{}", file))?),
        Commands::DeleteIndex => (Operation::DeleteIndex, json!({})),
        Commands::Vectorize => (Operation::VectorizeIndex, json!({})),
        Commands::DeleteVectorize => (Operation::DeleteVectorizeIndex, json!({})),
        Commands::Presign {
            filename,
            content_type,
        } => (
            Operation::PresignedUrl,
            json!({ "filename": filename, "contentType": content_type }),
        ),
        Commands::Search { request } => (Operation::Search, read_json(&request)?),
    };

    let (method, path) = operation.route();
    let method = reqwest::Method::from_bytes(method.as_str().as_bytes())?;
    let url = format!("{}{}", cli.endpoint, path);
    let response = client
        .request(method, &url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body: Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Parse inline JSON, or the contents of a file when prefixed with `@`
fn read_json(arg: &str) -> Result<Value> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&raw).context("Request is not valid JSON")
}
