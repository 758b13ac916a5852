//! atlas-extract: Knowledge-graph extraction for Atlas.
//!
//! Sends text to one or more LLM providers, decodes their loosely-shaped
//! JSON into raw graphs, merges and reconciles them with `atlas-sanitize`,
//! and optionally persists the result to Neo4j.

pub mod config;
pub mod decode;
pub mod error;
pub mod input;
pub mod persist;
pub mod pipeline;
pub mod provider;
pub mod retry;

pub use error::ExtractError;
pub use pipeline::{extract_knowledge_graph, ExtractionReport, GraphExtractor, ProviderRun};
pub use provider::{ProviderClient, ProviderKind};
pub use retry::RetryPolicy;
