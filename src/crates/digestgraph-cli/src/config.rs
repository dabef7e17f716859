//! On-disk run configuration: the topics list plus the small set of feature
//! toggles SPEC_FULL.md's CLI section calls for ("a minimal entry point,
//! not a full CLI surface"). Loaded once from a YAML file named on the
//! command line.

use std::path::Path;

use digestgraph_core::state::TopicConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// The newsletter's overall subject, used for `SharedState::new` and
    /// the cover image / glossary domain label.
    pub main_topic: String,
    pub topics: Vec<TopicSpec>,
    #[serde(default)]
    pub rss_feeds: Vec<String>,
    #[serde(default)]
    pub web_search_api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub query: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading topics config {}: {e}", path.display()))?;
        let config: RunConfig = serde_yaml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing topics config {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn topic_configs(&self) -> Vec<TopicConfig> {
        self.topics
            .iter()
            .map(|t| TopicConfig {
                name: t.name.clone(),
                description: t.description.clone(),
                query: t.query.clone(),
                keywords: t.keywords.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_topics_file() {
        let yaml = r#"
main_topic: oncology-ai
topics:
  - name: Early Detection
    query: "AI cancer detection"
  - name: Drug Discovery
    query: "machine learning drug discovery oncology"
    keywords: ["generative", "target identification"]
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.yaml");
        std::fs::write(&path, yaml).unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.main_topic, "oncology-ai");
        assert_eq!(config.topics.len(), 2);
        assert_eq!(config.topic_configs()[1].keywords.len(), 2);
    }
}
