//! atlas-graph: Neo4j persistence for sanitized knowledge graphs.
//!
//! Entities are stored as `Entity {name}` nodes, relationships as
//! `RELATED {relation}` edges, and a document's entity roots as
//! `(:Doc)-[:HAS_ENTITY]->(:Entity)` links. Only sanitized graphs should be
//! written; nothing here deduplicates or filters.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use mutations::WriteSummary;
