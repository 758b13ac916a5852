//! CLI entry point for atlas-extract.
//!
//! Reads text (from stdin or `--file`) or a raw graph (from stdin) and writes
//! the reconciled graph as JSON to stdout. Logs go to stderr; failures print `{"error": ...}` there
//! and exit with status 1.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use atlas_core::KnowledgeGraph;
use atlas_extract::config::{load_config, AtlasConfig};
use atlas_extract::decode::decode_graph_text;
use atlas_extract::input::read_source_file;
use atlas_extract::persist::{derive_doc_id, persist_graph};
use atlas_extract::provider::{resolve_providers, ProviderClient};
use atlas_extract::{extract_knowledge_graph, ExtractError};
use atlas_graph::GraphConfig;

#[derive(Parser)]
#[command(name = "atlas-extract")]
#[command(about = "Knowledge-graph extraction and reconciliation for Atlas")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: atlas).
    #[arg(short, long, default_value = "atlas", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a knowledge graph from text read on stdin or from a file.
    Extract {
        /// Model name; `--model` takes precedence.
        positional_model: Option<String>,
        #[arg(long)]
        model: Option<String>,
        /// Comma-separated providers (gemini, openai, deepseek).
        #[arg(long, visible_alias = "providers")]
        provider: Option<String>,
        /// Source document (.txt, .md, .html) instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Reconcile a raw graph JSON read on stdin.
    Sanitize {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(clap::Args)]
struct StoreArgs {
    /// Also write the result to Neo4j.
    #[arg(long)]
    neo4j: bool,
    /// Document to link the entity roots to.
    #[arg(long, requires = "neo4j")]
    doc_id: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = load_config(&cli.config)?;

    match cli.command {
        Command::Extract {
            positional_model,
            model,
            provider,
            file,
            store,
        } => {
            let input = match file {
                Some(path) => read_source_file(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let model = model.or(positional_model);
            let report = extract(&cfg, &input, model.as_deref(), provider.as_deref())
                .await
                .context("Failed to generate graph")?;
            println!("{}", serde_json::to_string(&report)?);

            if store.neo4j {
                let doc_id = store.doc_id.unwrap_or_else(|| derive_doc_id(&input));
                persist(&cfg, Some(doc_id.as_str()), &report.graph).await?;
            }
        }
        Command::Sanitize { store } => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let raw = decode_graph_text(&input).context("Failed to read raw graph")?;
            let graph = atlas_sanitize::sanitize_graph(raw, &cfg.limits);
            println!("{}", graph.to_json()?);

            if store.neo4j {
                persist(&cfg, store.doc_id.as_deref(), &graph).await?;
            }
        }
    }

    Ok(())
}

async fn extract(
    cfg: &AtlasConfig,
    text: &str,
    model: Option<&str>,
    provider: Option<&str>,
) -> Result<atlas_extract::ExtractionReport, ExtractError> {
    let kinds = resolve_providers(provider.or(cfg.providers.as_deref()))?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.http.timeout_secs))
        .build()?;
    let clients = kinds
        .into_iter()
        .map(|kind| ProviderClient::new(kind, cfg.provider(kind), model, http.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    extract_knowledge_graph(text, &clients, &cfg.limits, &cfg.retry).await
}

async fn persist(cfg: &AtlasConfig, doc_id: Option<&str>, graph: &KnowledgeGraph) -> anyhow::Result<()> {
    let graph_config = GraphConfig::from(&cfg.neo4j);
    persist_graph(&graph_config, doc_id, graph)
        .await
        .context("Failed to write graph to Neo4j")?;
    Ok(())
}
