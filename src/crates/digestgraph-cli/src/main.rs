//! # digestgraph-cli
//!
//! Minimal entry point: point it at a topics config and an output
//! directory, and it runs the pipeline once. Not a full CLI surface —
//! project scaffolding, graph validation, and the other subcommands
//! `langgraph-cli` offers are out of scope here (spec.md §6 Non-goals).

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use digestgraph_core::nodes::{build_pipeline, PipelineConfig, PipelineContext};
use digestgraph_core::state::SharedState;
use digestgraph_kg::{KnowledgeGraphBuilder, OntologyBundle};
use digestgraph_llm::{LlmGateway, LlmGatewayConfig, LlmProvider};
use digestgraph_output::{CoverImageProducer, OutputComposer};
use digestgraph_sources::{MetaRetriever, MetaRetrieverConfig, PubMedRetriever, Retriever, RssRetriever};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "digestgraph")]
#[command(about = "Generate an AI newsletter digest from a topics configuration", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML topics configuration (main_topic, topics, rss_feeds).
    #[arg(short, long)]
    topics: PathBuf,

    /// Directory to write the newsletter artifacts into.
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// LLM provider to use; credentials are read from its matching
    /// environment variable (ANTHROPIC_API_KEY / OPENAI_API_KEY) on first
    /// use, not at startup.
    #[arg(long, value_enum, default_value = "claude")]
    provider: ProviderArg,

    /// Model name passed to the chosen provider.
    #[arg(long)]
    model: Option<String>,

    #[arg(long, default_value_t = false)]
    disable_cover_image: bool,

    #[arg(long, default_value_t = false)]
    disable_charts: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ProviderArg {
    Claude,
    OpenAi,
}

impl From<ProviderArg> for LlmProvider {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Claude => LlmProvider::Claude,
            ProviderArg::OpenAi => LlmProvider::OpenAi,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let run_config = config::RunConfig::from_file(&cli.topics)?;
    let topics = run_config.topic_configs();

    let mut gateway_config = LlmGatewayConfig { provider: cli.provider.into(), ..LlmGatewayConfig::default() };
    if let Some(model) = cli.model {
        gateway_config.model = model;
    }
    let gateway = Arc::new(LlmGateway::new(gateway_config));

    let http_client = reqwest::Client::builder().build()?;
    let domain_retrievers: Vec<Arc<dyn Retriever>> = vec![Arc::new(PubMedRetriever::new(http_client.clone()))];
    let generic_retrievers: Vec<Arc<dyn Retriever>> = if run_config.rss_feeds.is_empty() {
        vec![]
    } else {
        vec![Arc::new(RssRetriever::new(http_client, run_config.rss_feeds.clone()))]
    };
    let meta_retriever = Arc::new(MetaRetriever::new(domain_retrievers, generic_retrievers, MetaRetrieverConfig::default()));

    let kg_builder = Arc::new(KnowledgeGraphBuilder::new(OntologyBundle::oncology_ai_default()));
    let output_composer = Arc::new(OutputComposer::new(cli.output_dir.clone(), CoverImageProducer::new(None)));

    let pipeline_config = PipelineConfig {
        output_dir: cli.output_dir,
        enable_cover_image: !cli.disable_cover_image,
        enable_charts: !cli.disable_charts,
        ..PipelineConfig::default()
    };

    let ctx = Arc::new(PipelineContext::with_config(
        gateway,
        Arc::new(digestgraph_core::prompts::PromptRegistry::builtin()),
        meta_retriever,
        kg_builder,
        output_composer,
        pipeline_config,
    ));

    let engine = build_pipeline(&ctx, topics);
    let initial = SharedState::new(run_config.main_topic);
    let final_state = engine.run(initial, None, None).await?;

    tracing::info!(
        run_id = %final_state.run_id,
        stage = %final_state.current_stage,
        errors = final_state.errors.len(),
        "digestgraph run complete"
    );
    if let Some(path) = &final_state.outputs.html_path {
        println!("newsletter: {path}");
    }

    Ok(())
}
