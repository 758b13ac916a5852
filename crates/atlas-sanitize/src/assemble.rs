//! Final graph assembly.

use atlas_core::{DocEntityRoot, KnowledgeGraph, Relationship};

use crate::canonical::CanonicalIndex;

/// Project the index and remapped relationships into the output graph.
///
/// `doc_entity_roots` gets one entry per canonical key in registration
/// order. No further validation happens here.
pub fn assemble_graph(index: CanonicalIndex, relationships: Vec<Relationship>) -> KnowledgeGraph {
    let mut nodes = Vec::with_capacity(index.len());
    let mut doc_entity_roots = Vec::with_capacity(index.len());

    for (key, node) in index.into_entries() {
        doc_entity_roots.push(DocEntityRoot {
            name: node.id.clone(),
            root_type: node.node_type.clone(),
            key,
        });
        nodes.push(node);
    }

    KnowledgeGraph {
        nodes,
        relationships,
        doc_entity_roots,
    }
}
