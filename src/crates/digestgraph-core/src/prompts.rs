//! The Prompt Registry (spec.md §4.4): a catalog of CO-STAR-structured
//! prompts (context, objective, style, tone, audience, response_format),
//! addressed as `agent_name.prompt_name`, rendered by substituting
//! `{variable}` placeholders.
//!
//! A registry may have a fallback catalog; lookup tries the primary first.
//! The built-in catalog (embedded via `include_str!`) ships as that
//! fallback so the pipeline runs without a user-supplied prompts file
//! (SPEC_FULL.md §4.4 expansion).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DigestGraphError, Result};
use digestgraph_llm::{JsonParser, NumericParser, RenderedPrompt, ResponseParser};

/// One CO-STAR-structured prompt definition, as loaded from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub context: String,
    pub objective: String,
    pub style: String,
    pub tone: String,
    pub audience: String,
    pub response_format: String,
    #[serde(default)]
    pub variables: Vec<String>,
    /// Which declared parser this prompt's `response_format` corresponds
    /// to. Not part of the on-disk catalog format's CO-STAR fields
    /// strictly, but required to pair a rendered prompt with its parser
    /// (spec.md §4.4: "the registry returns both the rendered prompt and
    /// the declared parser").
    #[serde(default)]
    pub grammar: Grammar,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grammar {
    #[default]
    FreeText,
    Numeric,
    Json,
}

impl Grammar {
    pub fn parser(self) -> Box<dyn ResponseParser> {
        match self {
            Grammar::FreeText => Box::new(FreeTextParser),
            Grammar::Numeric => Box::new(NumericParser { min: 0.0, max: 1.0 }),
            Grammar::Json => Box::new(JsonParser),
        }
    }
}

/// Passes the raw response through unvalidated, wrapped as a JSON string —
/// used for free-prose prompts (`executive_summary`) that have no
/// structured grammar to enforce.
struct FreeTextParser;

impl ResponseParser for FreeTextParser {
    fn parse(&self, raw: &str) -> std::result::Result<serde_json::Value, digestgraph_llm::LlmError> {
        Ok(serde_json::Value::String(raw.trim().to_string()))
    }
}

type Catalog = HashMap<String, HashMap<String, PromptSpec>>;

/// Loads and renders CO-STAR prompts addressed by `agent_name.prompt_name`.
pub struct PromptRegistry {
    primary: Catalog,
    fallback: Option<Catalog>,
}

impl PromptRegistry {
    pub fn from_yaml(primary_yaml: &str) -> Result<Self> {
        let primary: Catalog = serde_yaml::from_str(primary_yaml)?;
        Ok(Self { primary, fallback: None })
    }

    /// The embedded built-in catalog, covering every prompt named across
    /// spec.md §4.3 (`analyze_relevance`, `summarize_topic`,
    /// `executive_summary`, `review_summary`, `define_term`).
    pub fn builtin() -> Self {
        let catalog: Catalog =
            serde_yaml::from_str(BUILTIN_CATALOG_YAML).expect("embedded builtin prompt catalog must parse");
        Self { primary: catalog, fallback: None }
    }

    /// A registry that tries `primary` first and falls back to the
    /// embedded builtin catalog for anything missing.
    pub fn with_builtin_fallback(primary_yaml: &str) -> Result<Self> {
        let mut registry = Self::from_yaml(primary_yaml)?;
        registry.fallback = Some(Self::builtin().primary);
        Ok(registry)
    }

    fn lookup(&self, agent: &str, prompt: &str) -> Option<&PromptSpec> {
        self.primary
            .get(agent)
            .and_then(|prompts| prompts.get(prompt))
            .or_else(|| self.fallback.as_ref().and_then(|f| f.get(agent)).and_then(|p| p.get(prompt)))
    }

    /// Renders `agent_name.prompt_name` with `variables`, returning the
    /// rendered system/user message pair and the parser its
    /// `response_format` declares.
    ///
    /// Raises [`DigestGraphError::PromptNotFound`] if absent from both
    /// catalogs, or [`DigestGraphError::Config`] if a required variable is
    /// missing.
    pub fn render(
        &self,
        agent: &str,
        prompt_name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(RenderedPrompt, Box<dyn ResponseParser>)> {
        let spec = self.lookup(agent, prompt_name).ok_or_else(|| DigestGraphError::PromptNotFound {
            agent: agent.to_string(),
            prompt: prompt_name.to_string(),
        })?;

        for required in &spec.variables {
            if !variables.contains_key(required) {
                return Err(DigestGraphError::Config(format!(
                    "prompt {agent}.{prompt_name} missing required variable '{required}'"
                )));
            }
        }

        let system = format!(
            "# Context\n{}\n\n# Objective\n{}\n\n# Style\n{}\n\n# Tone\n{}\n\n# Audience\n{}\n\n# Response Format\n{}",
            substitute(&spec.context, variables),
            substitute(&spec.objective, variables),
            substitute(&spec.style, variables),
            substitute(&spec.tone, variables),
            substitute(&spec.audience, variables),
            substitute(&spec.response_format, variables),
        );
        let user = substitute(&spec.objective, variables);

        Ok((RenderedPrompt { system, user }, spec.grammar.parser()))
    }
}

fn substitute(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in variables {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

const BUILTIN_CATALOG_YAML: &str = include_str!("../prompts/builtin_catalog.yaml");
