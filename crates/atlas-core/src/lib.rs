//! atlas-core: Shared types, limits, and error handling for Atlas.
//!
//! This crate provides the foundational types used across all Atlas components:
//! - Entity nodes and directed relationships of an extracted knowledge graph
//! - The document entity-root index derived from a sanitized graph
//! - Size limits applied during reconciliation
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::GraphLimits;
pub use error::AtlasError;
pub use types::{
    DocEntityRoot, KnowledgeGraph, Node, Properties, Relationship, DEFAULT_NODE_TYPE,
    DEFAULT_RELATIONSHIP_TYPE,
};
