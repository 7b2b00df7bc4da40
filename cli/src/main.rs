//! CLI entrypoint for llm-council
//!
//! Wires the layers together with dependency injection: configuration ->
//! provider adapters -> routing gateway -> optional retrieval stack ->
//! council use case.

mod output;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use council_application::{
    ChunkRepository, ConflictDetector, DocumentIngest, DocumentRecord, EmbeddingEngine,
    IngestDocumentUseCase, LlmGateway, RagContextBuilder, RunCouncilInput, RunCouncilUseCase,
    SourceRecord,
};
use council_domain::{Chunker, DetectedConflict, ModelId, Query, SourceType};
use council_infrastructure::{
    ConfigLoader, FileConfig, InMemoryChunkStore, OpenAiAdapter, OpenAiEmbeddings,
    OpenRouterAdapter, ProviderAdapter, RoutingGateway,
};
use output::{EventPrinter, OutputFormat, print_outcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "llm-council", version, about = "Council of LLMs with trust-scored retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the council a question
    Ask {
        question: String,

        /// Council member (repeatable; overrides config)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Chairman model (overrides config)
        #[arg(long)]
        chairman: Option<String>,

        /// Skip the peer review stage
        #[arg(long)]
        no_review: bool,

        /// Ingest text/markdown files from this directory and augment the query
        #[arg(long)]
        knowledge: Option<PathBuf>,

        /// Skip conflict detection during augmentation
        #[arg(long)]
        no_conflicts: bool,

        /// Print each member's full answer as it arrives
        #[arg(long)]
        full: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List the models the configured providers serve
    Models,

    /// Query the knowledge base directly, without the council
    Search {
        query: String,

        /// Directory of text/markdown files to ingest
        #[arg(long)]
        knowledge: PathBuf,

        /// Skip conflict detection
        #[arg(long)]
        no_conflicts: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("{e}"))?;

    match cli.command {
        Command::Ask {
            question,
            models,
            chairman,
            no_review,
            knowledge,
            no_conflicts,
            full,
            output,
        } => {
            run_ask(
                &config, question, models, chairman, no_review, knowledge, no_conflicts, full,
                output,
            )
            .await
        }
        Command::Models => run_models(&config).await,
        Command::Search {
            query,
            knowledge,
            no_conflicts,
        } => run_search(&config, &query, &knowledge, no_conflicts).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_ask(
    config: &FileConfig,
    question: String,
    models: Vec<String>,
    chairman: Option<String>,
    no_review: bool,
    knowledge: Option<PathBuf>,
    no_conflicts: bool,
    full: bool,
    output: OutputFormat,
) -> Result<()> {
    let question: Query = question.parse()?;
    let gateway = build_gateway(config)?;

    let mut council_config = config.council_config();
    if !models.is_empty() {
        council_config.members = models.iter().map(ModelId::new).collect();
    }
    if let Some(chairman) = chairman {
        council_config.chairman = ModelId::new(chairman);
    }
    if no_review {
        council_config.enable_review = false;
    }
    if council_config.members.is_empty() {
        // No explicit roster: seat every model the providers serve
        council_config.members = gateway
            .available_models()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
    }
    if council_config.members.is_empty() {
        bail!("no council members configured; pass --model or set [council] models");
    }

    let mut use_case = RunCouncilUseCase::new(Arc::clone(&gateway), council_config.clone());
    let mut input = RunCouncilInput::new(question.clone());
    if let Some(dir) = &knowledge {
        let rag = build_rag(config, Arc::clone(&gateway) as Arc<dyn LlmGateway>, dir).await?;
        use_case = use_case.with_rag(rag);
        input = input.with_rag();
        if no_conflicts {
            input = input.without_conflict_detection();
        }
    }

    if output == OutputFormat::Json {
        let outcome = use_case.execute(input).await?;
        return print_outcome(&outcome, output);
    }

    println!();
    println!("{}", "LLM Council".bold());
    println!("{} {question}", "Question:".bold());
    println!(
        "{} {}",
        "Members: ".bold(),
        council_config
            .members
            .iter()
            .map(|m| m.short_name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut printer = EventPrinter::new(full);
        while let Some(event) = rx.recv().await {
            printer.handle(&event);
        }
        printer.finish();
    });

    let result = use_case.execute_streaming(input, tx).await;
    printer.await.context("event printer task failed")?;
    let outcome = result?;

    print_outcome(&outcome, output)
}

async fn run_models(config: &FileConfig) -> Result<()> {
    let gateway = build_gateway(config)?;
    let chairman = ModelId::new(&config.council.chairman);

    for model in gateway.available_models().await? {
        let marker = if model.id == chairman {
            " (chairman)".cyan().to_string()
        } else {
            String::new()
        };
        println!("{}  [{}]{}", model.id, model.provider.dimmed(), marker);
    }
    Ok(())
}

async fn run_search(
    config: &FileConfig,
    query: &str,
    knowledge: &Path,
    no_conflicts: bool,
) -> Result<()> {
    let gateway = build_gateway(config)?;
    let rag = build_rag(config, gateway as Arc<dyn LlmGateway>, knowledge).await?;

    let context = rag.build(query, None, !no_conflicts).await?;
    if context.is_empty() {
        println!("No matching chunks.");
        return Ok(());
    }

    for chunk in &context.chunks {
        println!(
            "{} {}",
            format!("[{:.3}]", chunk.final_score).bold(),
            chunk.citation()
        );
        println!("{}", rag.scorer().explain(chunk).dimmed());
        println!("{}", chunk.chunk.content);
        println!();
    }

    let report = DetectedConflict::format_report(&context.conflicts);
    if !report.is_empty() {
        println!("{}", report.yellow());
    }
    Ok(())
}

/// Build the routing gateway from every provider with credentials present.
fn build_gateway(config: &FileConfig) -> Result<Arc<RoutingGateway>> {
    let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    let openai = config.openai_settings();
    if let Ok(key) = std::env::var(&openai.api_key_env)
        && !key.is_empty()
    {
        providers.push(Arc::new(OpenAiAdapter::new(
            key,
            openai.base_url,
            openai.models,
            openai.timeout_secs,
        )?));
    }

    let openrouter = config.openrouter_settings();
    if let Ok(key) = std::env::var(&openrouter.api_key_env)
        && !key.is_empty()
    {
        providers.push(Arc::new(OpenRouterAdapter::new(
            key,
            openrouter.base_url,
            openrouter.models,
            openrouter.timeout_secs,
        )?));
    }

    if providers.is_empty() {
        bail!(
            "no provider credentials found; set {} or {}",
            config.openai_settings().api_key_env,
            config.openrouter_settings().api_key_env
        );
    }

    Ok(Arc::new(RoutingGateway::new(
        providers,
        &config.providers.routing,
        Some(config.default_provider()),
    )))
}

/// Ingest a directory of text/markdown files into an in-memory store and
/// return the retrieval stack built on top of it.
async fn build_rag(
    config: &FileConfig,
    gateway: Arc<dyn LlmGateway>,
    dir: &Path,
) -> Result<Arc<RagContextBuilder>> {
    let settings = config.openai_settings();
    let api_key = std::env::var(&settings.api_key_env)
        .map_err(|_| anyhow!("--knowledge requires {} for embeddings", settings.api_key_env))?;

    let embeddings = Arc::new(OpenAiEmbeddings::new(
        api_key,
        settings.base_url.clone(),
        config.embedding_config(),
        settings.timeout_secs,
    )?);

    let rag_config = config.rag_config();
    let store = Arc::new(InMemoryChunkStore::new());
    let ingest = IngestDocumentUseCase::new(
        Chunker::new(rag_config.chunk_size, rag_config.chunk_overlap),
        EmbeddingEngine::new(embeddings.clone()),
        store.clone(),
    );

    let source_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "local".to_string());
    let source_id = store
        .register_source(SourceRecord {
            name: source_name,
            source_type: SourceType::Document,
            base_trust_score: None,
            active: true,
        })
        .await?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read knowledge directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md" | "markdown" | "txt")
            )
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("no .md or .txt files found in {}", dir.display());
    }

    for path in paths {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let updated_at = std::fs::metadata(&path)
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);
        let title = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let document_id = store
            .register_document(DocumentRecord {
                source_id,
                title,
                author: None,
                author_trust: None,
                updated_at,
            })
            .await?;
        let report = ingest
            .execute(DocumentIngest {
                document_id,
                text,
            })
            .await?;
        info!(
            file = %path.display(),
            chunks = report.chunks_written,
            embedded = report.chunks_embedded,
            "ingested knowledge file"
        );
    }

    let detector = ConflictDetector::new(gateway, rag_config.conflict.clone());
    Ok(Arc::new(RagContextBuilder::new(
        EmbeddingEngine::new(embeddings),
        store,
        detector,
        rag_config,
    )))
}
