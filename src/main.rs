use clap::Parser;
use log::{debug, error};
use serde::Serialize;
use std::path::PathBuf;

use paper_metadata::{AppConfig, BatchEntry, BatchItem, ModelId};

#[derive(Parser, Debug)]
#[command(name = "paper-metadata")]
#[command(about = "Extract title, authors, year and keywords from article text using LLMs")]
struct Cli {
    /// Text files holding the extracted first pages of each article
    #[arg(required_unless_present_any = ["keys", "models"])]
    files: Vec<PathBuf>,

    /// Model identifier (gpt4o, gpt4o-mini, sonnet, deepseek, gemini-2.5-pro, gemini-2.0-flash)
    #[arg(short, long, env = "PAPER_METADATA_MODEL")]
    model: Option<String>,

    /// Configuration file (defaults to paper-metadata.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request timeout in seconds, overriding the configuration
    #[arg(long)]
    timeout: Option<u64>,

    /// Show which providers have an API key configured and exit
    #[arg(long)]
    keys: bool,

    /// List supported models and exit
    #[arg(long)]
    models: bool,

    /// Add a filename suggestion built from the extracted metadata
    #[arg(long)]
    rename_hint: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    entry: &'a BatchEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_filename: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    // Keys are conventionally kept in a .env file next to the data
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }

    let args = Cli::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    let credentials = config.credentials();

    if args.models {
        for model in ModelId::ALL {
            println!(
                "{:<18} {:<17} {:<10} {}",
                model.as_str(),
                model.display_name(),
                model.provider(),
                model.upstream_model()
            );
        }
        return Ok(());
    }

    if args.keys {
        println!("{}", serde_json::to_string_pretty(&credentials.status())?);
        return Ok(());
    }

    let model = args.model.unwrap_or_else(|| config.default_model.clone());
    let gateway = config.gateway()?;

    let mut items = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let text = tokio::fs::read_to_string(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        items.push(BatchItem::new(filename, text));
    }

    let entries = gateway
        .extract_batch(&items, &model, &credentials, None)
        .await;

    let output: Vec<Output> = entries
        .iter()
        .map(|entry| Output {
            entry,
            suggested_filename: if args.rename_hint {
                entry
                    .metadata
                    .as_ref()
                    .and_then(|record| record.suggested_filename())
            } else {
                None
            },
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !entries.is_empty() && entries.iter().all(|entry| !entry.success) {
        error!("No document could be analysed");
        std::process::exit(1);
    }

    Ok(())
}
