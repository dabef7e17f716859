//! Search Connectors (spec.md §4.6, Component C6): pluggable retrievers
//! composed under a Meta-Retriever with dedup, source-priority ranking, and
//! soft-timeout failure isolation.

pub mod article;
pub mod dateparse;
pub mod error;
pub mod meta;
pub mod pubmed;
pub mod retriever;
pub mod rss;
pub mod websearch;

pub use article::Article;
pub use error::{Result, SourceError};
pub use meta::{MetaRetriever, MetaRetrieverConfig};
pub use pubmed::PubMedRetriever;
pub use retriever::Retriever;
pub use rss::RssRetriever;
pub use websearch::{SearchProvider, WebSearchRetriever};
