//! PubMed retriever: a two-step NCBI E-utilities client (esearch then
//! efetch), grounded in spec.md §4.6's domain-source list for biomedical
//! topics.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::article::Article;
use crate::dateparse::parse_permissive;
use crate::error::{Result, SourceError};
use crate::retriever::Retriever;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

pub struct PubMedRetriever {
    client: reqwest::Client,
    base_url_esearch: String,
    base_url_efetch: String,
}

impl PubMedRetriever {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url_esearch: ESEARCH_URL.to_string(),
            base_url_efetch: EFETCH_URL.to_string(),
        }
    }

    /// Used by tests to point at a local mock server instead of NCBI.
    #[cfg(test)]
    pub fn with_base_urls(client: reqwest::Client, esearch: String, efetch: String) -> Self {
        Self { client, base_url_esearch: esearch, base_url_efetch: efetch }
    }

    async fn esearch(&self, query: &str, days_back: u32, max_results: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.base_url_esearch)
            .query(&[
                ("db", "pubmed"),
                ("term", query),
                ("retmax", &max_results.to_string()),
                ("reldate", &days_back.to_string()),
                ("datetype", "pdat"),
                ("retmode", "xml"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SourceError::Retriever { source_name: "pubmed".into(), message: e.to_string() })?;

        let body = response.text().await?;
        Ok(parse_id_list(&body)?)
    }

    async fn efetch(&self, ids: &[String]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .get(&self.base_url_efetch)
            .query(&[("db", "pubmed"), ("id", &ids.join(",")), ("retmode", "xml"), ("rettype", "abstract")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SourceError::Retriever { source_name: "pubmed".into(), message: e.to_string() })?;

        let body = response.text().await?;
        Ok(parse_articles(&body)?)
    }
}

#[async_trait]
impl Retriever for PubMedRetriever {
    fn name(&self) -> &str {
        "pubmed"
    }

    async fn search(&self, query: &str, max_results: usize, days_back: u32) -> Result<Vec<Article>> {
        let ids = self.esearch(query, days_back, max_results).await?;
        debug!(count = ids.len(), "pubmed esearch returned ids");
        let articles = self.efetch(&ids).await?;
        Ok(articles.into_iter().filter(|a| a.is_valid()).take(max_results).collect())
    }
}

fn parse_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut ids = Vec::new();
    let mut in_id = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Id" => in_id = true,
            Event::End(e) if e.name().as_ref() == b"Id" => in_id = false,
            Event::Text(t) if in_id => ids.push(t.unescape()?.into_owned()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(ids)
}

/// Minimal PubmedArticleSet walker: pulls PMID, ArticleTitle, AbstractText
/// and PubDate out of each PubmedArticle element without building a full
/// DOM, since only a handful of fields matter downstream.
fn parse_articles(xml: &str) -> Result<Vec<Article>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut articles = Vec::new();
    let mut pmid = String::new();
    let mut title = String::new();
    let mut abstract_text = String::new();
    let mut year = String::new();
    let mut month = String::new();
    let mut day = String::new();

    let mut tag_stack: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => tag_stack.push(e.name().as_ref().to_vec()),
            Event::End(e) => {
                let name = e.name().as_ref().to_vec();
                tag_stack.pop();
                if name == b"PubmedArticle" {
                    let url = format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/");
                    let published_date = if year.is_empty() {
                        None
                    } else {
                        let m = if month.is_empty() { "Jan".to_string() } else { month.clone() };
                        let d = if day.is_empty() { "1".to_string() } else { day.clone() };
                        parse_permissive(&format!("{m} {d}, {year}"))
                    };
                    articles.push(Article {
                        title: title.trim().to_string(),
                        url,
                        source: Some("pubmed".to_string()),
                        content: if abstract_text.trim().is_empty() { None } else { Some(abstract_text.trim().to_string()) },
                        summary: None,
                        published_date,
                    });
                    pmid.clear();
                    title.clear();
                    abstract_text.clear();
                    year.clear();
                    month.clear();
                    day.clear();
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                match tag_stack.last().map(|v| v.as_slice()) {
                    Some(b"PMID") if pmid.is_empty() => pmid = text,
                    Some(b"ArticleTitle") => title.push_str(&text),
                    Some(b"AbstractText") => {
                        if !abstract_text.is_empty() {
                            abstract_text.push(' ');
                        }
                        abstract_text.push_str(&text);
                    }
                    Some(b"Year") if year.is_empty() => year = text,
                    Some(b"Month") if month.is_empty() => month = text,
                    Some(b"Day") if day.is_empty() => day = text,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(articles)
}
