//! The provider-facing contract: a rendered CO-STAR prompt in, raw text out.
//!
//! Parsing the raw text into a structured value is deliberately not part of
//! [`ChatModel`] — the Prompt Registry pairs every prompt with a
//! [`ResponseParser`] that knows its declared `response_format`, and the
//! gateway applies it after the provider call returns.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{LlmError, Result};

/// A prompt already rendered to its system/user message pair by the Prompt
/// Registry.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Per-call generation parameters.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Declares the grammar a prompt's response must satisfy and extracts a
/// [`serde_json::Value`] from the model's raw text.
///
/// Implementations tolerate surrounding prose: a parser looks for the first
/// syntactically valid instance of its grammar rather than requiring the
/// entire response to be that grammar (see spec Scenario F).
pub trait ResponseParser: Send + Sync {
    fn parse(&self, raw: &str) -> std::result::Result<Value, LlmError>;
}

/// A parser that requires the response to be (or contain) a single real
/// number, optionally clamped. Used by `analyze_relevance`.
pub struct NumericParser {
    pub min: f64,
    pub max: f64,
}

impl ResponseParser for NumericParser {
    fn parse(&self, raw: &str) -> std::result::Result<Value, LlmError> {
        static NUMBER: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        let re = NUMBER.get_or_init(|| regex::Regex::new(r"-?\d+(\.\d+)?").unwrap());
        let candidate = re
            .find(raw)
            .ok_or_else(|| LlmError::Parse(format!("no numeric value found in: {raw:?}")))?;
        let value: f64 = candidate
            .as_str()
            .parse()
            .map_err(|_| LlmError::Parse(format!("unparseable number: {raw:?}")))?;
        if value < self.min || value > self.max {
            return Err(LlmError::Parse(format!(
                "value {value} outside expected range [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(Value::from(value))
    }
}

/// A parser that extracts the first syntactically valid JSON object or
/// array from the response, tolerating leading/trailing prose.
pub struct JsonParser;

impl ResponseParser for JsonParser {
    fn parse(&self, raw: &str) -> std::result::Result<Value, LlmError> {
        extract_first_json_value(raw).ok_or_else(|| LlmError::Parse(format!("no valid JSON found in: {raw:?}")))
    }
}

/// Scans `text` for the first `{...}` or `[...]` span that parses as JSON,
/// using brace/bracket depth tracking so embedded strings containing braces
/// don't confuse the boundary search.
fn extract_first_json_value(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    for (start, &b) in bytes.iter().enumerate() {
        if b != b'{' && b != b'[' {
            continue;
        }
        let open = b;
        let close = if open == b'{' { b'}' } else { b']' };
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset + 1;
                        if let Ok(value) = serde_json::from_str::<Value>(&text[start..end]) {
                            return Some(value);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// A chat-completion backend. Implementations MUST be constructible without
/// credentials present — any missing-configuration failure happens inside
/// `raw_complete` (surfaced as [`LlmError::ConfigError`]), not at
/// construction time. See spec.md §9's "lazy singleton" redesign note.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` to the provider and return its raw text response.
    async fn raw_complete(&self, prompt: &RenderedPrompt, opts: &CompletionOptions) -> Result<String>;

    /// Short identifier used in logs and error messages (`"claude"`, `"openai"`).
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_parser_coerces_extra_text() {
        let parser = NumericParser { min: 0.0, max: 1.0 };
        let value = parser.parse("The relevance score is 0.85 out of 1.0.").unwrap();
        assert_eq!(value, Value::from(0.85));
    }

    #[test]
    fn numeric_parser_rejects_non_numeric() {
        let parser = NumericParser { min: 0.0, max: 1.0 };
        assert!(parser.parse("very high").is_err());
    }

    #[test]
    fn numeric_parser_rejects_out_of_range() {
        let parser = NumericParser { min: 0.0, max: 1.0 };
        assert!(parser.parse("42").is_err());
    }

    #[test]
    fn json_parser_tolerates_leading_prose() {
        let parser = JsonParser;
        let raw = r#"Sure, here is the summary: {"overview": "x", "key_findings": ["a"], "notable_trends": []}"#;
        let value = parser.parse(raw).unwrap();
        assert_eq!(value["overview"], Value::from("x"));
    }

    #[test]
    fn json_parser_fails_on_no_json() {
        let parser = JsonParser;
        assert!(parser.parse("no json here at all").is_err());
    }
}
