//! [`PipelineContext`]: the leaf services every node closure captures, plus
//! the `TermDefiner` adapter that lets `digestgraph-kg::build_glossary` call
//! back into the LLM Gateway + Prompt Registry without those crates
//! depending on each other (spec.md §4.7 glossary generation).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use digestgraph_kg::{EntityType as KgEntityType, KnowledgeGraphBuilder, TermDefiner};
use digestgraph_llm::{CompletionOptions, LlmGateway};
use digestgraph_output::OutputComposer;
use digestgraph_sources::MetaRetriever;

use crate::nodes::config::PipelineConfig;
use crate::prompts::PromptRegistry;

pub struct PipelineContext {
    pub gateway: Arc<LlmGateway>,
    pub prompts: Arc<PromptRegistry>,
    pub meta_retriever: Arc<MetaRetriever>,
    pub kg_builder: Arc<KnowledgeGraphBuilder>,
    pub output_composer: Arc<OutputComposer>,
    pub config: PipelineConfig,
}

impl PipelineContext {
    pub fn new(
        gateway: Arc<LlmGateway>,
        prompts: Arc<PromptRegistry>,
        meta_retriever: Arc<MetaRetriever>,
        kg_builder: Arc<KnowledgeGraphBuilder>,
        output_composer: Arc<OutputComposer>,
    ) -> Self {
        Self::with_config(gateway, prompts, meta_retriever, kg_builder, output_composer, PipelineConfig::default())
    }

    pub fn with_config(
        gateway: Arc<LlmGateway>,
        prompts: Arc<PromptRegistry>,
        meta_retriever: Arc<MetaRetriever>,
        kg_builder: Arc<KnowledgeGraphBuilder>,
        output_composer: Arc<OutputComposer>,
        config: PipelineConfig,
    ) -> Self {
        Self { gateway, prompts, meta_retriever, kg_builder, output_composer, config }
    }

    /// A [`TermDefiner`] backed by this context's gateway and prompt
    /// registry, for `extract_graph`'s glossary generation step.
    pub fn term_definer(self: &Arc<Self>) -> GatewayTermDefiner {
        GatewayTermDefiner { ctx: Arc::clone(self) }
    }
}

pub struct GatewayTermDefiner {
    ctx: Arc<PipelineContext>,
}

#[async_trait]
impl TermDefiner for GatewayTermDefiner {
    async fn define(&self, term: &str, entity_type: KgEntityType, contexts: &[String], domain: &str) -> Option<(String, Vec<String>)> {
        let mut vars = HashMap::new();
        vars.insert("term".to_string(), term.to_string());
        vars.insert("entity_type".to_string(), entity_type.label().to_string());
        vars.insert("contexts".to_string(), contexts.join(" / "));
        vars.insert("domain".to_string(), domain.to_string());

        let (rendered, parser) = self.ctx.prompts.render("glossary", "define_term", &vars).ok()?;

        for _attempt in 0..2 {
            let value = self
                .ctx
                .gateway
                .complete(rendered.clone(), parser.as_ref(), CompletionOptions::default())
                .await
                .ok()?;
            let definition = value.get("definition").and_then(|v| v.as_str());
            if let Some(definition) = definition {
                let related = value
                    .get("related")
                    .and_then(|v| v.as_array())
                    .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                return Some((definition.to_string(), related));
            }
        }
        None
    }
}
