//! Relationship remapping.
//!
//! Rewrites raw relationship endpoints onto canonical ids, drops edges whose
//! endpoints were filtered or never admitted, and enforces the relationship
//! cap first-come-first-served.

use atlas_core::{Node, Relationship, DEFAULT_NODE_TYPE, DEFAULT_RELATIONSHIP_TYPE};

use crate::canonical::CanonicalIndex;

/// Counts reported alongside the remapped relationships.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemapSummary {
    pub admitted: usize,
    pub dangling: usize,
    pub over_cap: usize,
}

/// Remap raw relationships through the index, keeping at most
/// `max_relationships` in input order.
pub fn remap_relationships(
    raw: Vec<Relationship>,
    index: &CanonicalIndex,
    max_relationships: usize,
) -> (Vec<Relationship>, RemapSummary) {
    let mut summary = RemapSummary::default();
    let mut relationships = Vec::new();
    let total = raw.len();

    for (seen, rel) in raw.into_iter().enumerate() {
        if relationships.len() >= max_relationships {
            summary.over_cap = total - seen;
            break;
        }

        let source_id = index.resolve(&rel.source.id).to_string();
        let target_id = index.resolve(&rel.target.id).to_string();
        if !index.contains(&source_id) || !index.contains(&target_id) {
            tracing::debug!(
                source = %rel.source.id,
                target = %rel.target.id,
                rel_type = %rel.rel_type,
                "Dropping relationship with unadmitted endpoint"
            );
            summary.dangling += 1;
            continue;
        }

        let rel_type = match rel.rel_type.trim() {
            "" => DEFAULT_RELATIONSHIP_TYPE.to_string(),
            t => t.to_string(),
        };

        relationships.push(Relationship {
            source: endpoint(index, source_id, rel.source),
            target: endpoint(index, target_id, rel.target),
            rel_type,
            properties: rel.properties,
        });
    }

    summary.admitted = relationships.len();
    (relationships, summary)
}

/// Rebuild an endpoint with the canonical node's current type. The raw
/// endpoint's type is only a fallback; its properties are carried as-is.
fn endpoint(index: &CanonicalIndex, canonical_id: String, raw: Node) -> Node {
    let node_type = match index.get(&canonical_id) {
        Some(canonical) => canonical.node_type.clone(),
        None if !raw.node_type.trim().is_empty() => raw.node_type,
        None => DEFAULT_NODE_TYPE.to_string(),
    };
    Node {
        id: canonical_id,
        node_type,
        properties: raw.properties,
    }
}
