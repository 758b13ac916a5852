//! atlas-sanitize: Reconciliation of raw extracted knowledge graphs.
//!
//! An extraction model returns graphs full of surface-form duplicates,
//! inconsistent types, document-layout noise and dangling edges. This crate
//! turns such a graph into a bounded, internally consistent one:
//!
//! structure filter → canonical index (key normalizer + type priority)
//! → relationship remapper → graph assembler.
//!
//! Everything here is synchronous and side-effect free apart from `tracing`
//! events. No state survives between calls.

pub mod assemble;
pub mod canonical;
pub mod normalize;
pub mod priority;
pub mod remap;
pub mod structure;

pub use canonical::{Admission, CanonicalIndex};
pub use normalize::normalize_entity_key;
pub use priority::{resolve_type, type_rank};
pub use structure::{is_structural, structural_rule, StructureRule};

use atlas_core::{GraphLimits, KnowledgeGraph};

/// Per-call counts, logged and returned for callers that report them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeSummary {
    pub raw_nodes: usize,
    pub structural: usize,
    pub empty_keys: usize,
    pub merged: usize,
    pub canonical_nodes: usize,
    /// Raw nodes never examined because the node cap was reached.
    pub unexamined_nodes: usize,
    pub raw_relationships: usize,
    pub relationships: usize,
    pub dangling_relationships: usize,
    pub over_cap_relationships: usize,
}

/// Sanitize a raw graph under the given limits.
pub fn sanitize_graph(raw: KnowledgeGraph, limits: &GraphLimits) -> KnowledgeGraph {
    sanitize_graph_with_summary(raw, limits).0
}

/// Sanitize a raw graph and report what happened to each raw element.
pub fn sanitize_graph_with_summary(
    raw: KnowledgeGraph,
    limits: &GraphLimits,
) -> (KnowledgeGraph, SanitizeSummary) {
    let mut summary = SanitizeSummary {
        raw_nodes: raw.nodes.len(),
        raw_relationships: raw.relationships.len(),
        ..Default::default()
    };

    let mut index = CanonicalIndex::new(limits.max_graph_nodes);
    for (seen, node) in raw.nodes.into_iter().enumerate() {
        if index.is_full() {
            summary.unexamined_nodes = summary.raw_nodes - seen;
            break;
        }

        if let Some(rule) = structural_rule(&node.id, &node.node_type) {
            tracing::debug!(id = %node.id, node_type = %node.node_type, rule = %rule, "Rejected structural node");
            summary.structural += 1;
            continue;
        }

        match index.admit(node) {
            Admission::Created(_) => {}
            Admission::Merged(_) => summary.merged += 1,
            Admission::EmptyKey => summary.empty_keys += 1,
        }
    }
    summary.canonical_nodes = index.len();

    let (relationships, remap) =
        remap::remap_relationships(raw.relationships, &index, limits.max_graph_relationships);
    summary.relationships = remap.admitted;
    summary.dangling_relationships = remap.dangling;
    summary.over_cap_relationships = remap.over_cap;

    let graph = assemble::assemble_graph(index, relationships);

    tracing::info!(
        raw_nodes = summary.raw_nodes,
        nodes = summary.canonical_nodes,
        merged = summary.merged,
        structural = summary.structural,
        unexamined = summary.unexamined_nodes,
        raw_relationships = summary.raw_relationships,
        relationships = summary.relationships,
        dangling = summary.dangling_relationships,
        "Sanitized knowledge graph"
    );

    (graph, summary)
}
