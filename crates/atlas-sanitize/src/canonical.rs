//! Canonical entity index.
//!
//! Deduplicates raw nodes by normalized key, records where every raw id
//! ended up (the alias map), and enforces the node cap. Insertion order is
//! load-bearing: the first surface form seen becomes the displayed id and
//! `doc_entity_roots` follows registration order.

use std::collections::HashMap;

use atlas_core::{Node, DEFAULT_NODE_TYPE};

use crate::normalize::normalize_entity_key;
use crate::priority::resolve_type;

/// Outcome of offering a raw node to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// A new canonical node was created at this position.
    Created(usize),
    /// The node collapsed into the existing canonical node at this position.
    Merged(usize),
    /// The id normalized to nothing; no alias was recorded.
    EmptyKey,
}

/// Insertion-ordered canonical node set plus the alias map.
#[derive(Debug)]
pub struct CanonicalIndex {
    /// Canonical nodes in registration order.
    nodes: Vec<Node>,
    /// Normalized key of `nodes[i]`.
    keys: Vec<String>,
    /// Normalized key → position in `nodes`.
    by_key: HashMap<String, usize>,
    /// Canonical id → position in `nodes`.
    by_id: HashMap<String, usize>,
    /// Raw (trimmed) id → canonical id.
    aliases: HashMap<String, String>,
    max_nodes: usize,
}

impl CanonicalIndex {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            nodes: Vec::new(),
            keys: Vec::new(),
            by_key: HashMap::new(),
            by_id: HashMap::new(),
            aliases: HashMap::new(),
            max_nodes,
        }
    }

    /// Whether the node cap has been reached. Once full, callers stop
    /// offering nodes altogether, so later raw ids get no alias entry even
    /// when they duplicate an admitted entity.
    pub fn is_full(&self) -> bool {
        self.nodes.len() >= self.max_nodes
    }

    /// Offer a raw node that already passed the structure filter.
    pub fn admit(&mut self, raw: Node) -> Admission {
        let id = raw.id.trim().to_string();
        let node_type = match raw.node_type.trim() {
            "" => DEFAULT_NODE_TYPE.to_string(),
            t => t.to_string(),
        };

        let key = normalize_entity_key(&id);
        if key.is_empty() {
            return Admission::EmptyKey;
        }

        if let Some(&pos) = self.by_key.get(&key) {
            let existing = &mut self.nodes[pos];
            self.aliases.insert(id, existing.id.clone());
            // The duplicate's properties are dropped; first admitted wins.
            let resolved = resolve_type(&existing.node_type, &node_type).to_string();
            existing.node_type = resolved;
            return Admission::Merged(pos);
        }

        let pos = self.nodes.len();
        self.by_key.insert(key.clone(), pos);
        self.by_id.insert(id.clone(), pos);
        self.aliases.insert(id.clone(), id.clone());
        self.keys.push(key);
        self.nodes.push(Node {
            id,
            node_type,
            properties: raw.properties,
        });
        Admission::Created(pos)
    }

    /// Canonical id for a raw endpoint id; identity when the id was never seen.
    pub fn resolve<'a>(&'a self, raw_id: &'a str) -> &'a str {
        self.aliases
            .get(raw_id)
            .map(String::as_str)
            .unwrap_or(raw_id)
    }

    /// The admitted canonical node with this id, if any.
    pub fn get(&self, canonical_id: &str) -> Option<&Node> {
        self.by_id.get(canonical_id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, canonical_id: &str) -> bool {
        self.by_id.contains_key(canonical_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Canonical nodes paired with their keys, in registration order.
    pub fn into_entries(self) -> impl Iterator<Item = (String, Node)> {
        self.keys.into_iter().zip(self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> atlas_core::Properties {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_surface_form_wins() {
        let mut index = CanonicalIndex::new(10);
        assert_eq!(
            index.admit(Node::new("Marie Curie", "Concept")),
            Admission::Created(0)
        );
        assert_eq!(
            index.admit(Node::new("marie curie（scientist）", "人")),
            Admission::Merged(0)
        );

        assert_eq!(index.len(), 1);
        assert_eq!(index.nodes()[0].id, "Marie Curie");
        assert_eq!(index.nodes()[0].node_type, "人");
        assert_eq!(index.resolve("marie curie（scientist）"), "Marie Curie");
        assert_eq!(index.resolve("Marie Curie"), "Marie Curie");
    }

    #[test]
    fn test_ids_are_trimmed() {
        let mut index = CanonicalIndex::new(10);
        index.admit(Node::new("  Rust  ", "language"));
        assert_eq!(index.nodes()[0].id, "Rust");
        assert!(index.contains("Rust"));
        assert_eq!(index.resolve("Rust"), "Rust");
    }

    #[test]
    fn test_blank_type_defaults() {
        let mut index = CanonicalIndex::new(10);
        index.admit(Node::new("Rust", "   "));
        assert_eq!(index.nodes()[0].node_type, "Concept");
    }

    #[test]
    fn test_duplicate_properties_discarded() {
        let mut index = CanonicalIndex::new(10);
        index.admit(Node::new("Kafka", "技术").with_properties(props(json!({"since": 2011}))));
        index.admit(Node::new("kafka", "技术").with_properties(props(json!({"since": 1999}))));

        let node = index.get("Kafka").unwrap();
        assert_eq!(node.properties.as_ref().unwrap()["since"], 2011);
    }

    #[test]
    fn test_empty_key_records_no_alias() {
        let mut index = CanonicalIndex::new(10);
        assert_eq!(index.admit(Node::new("(注释)", "人")), Admission::EmptyKey);
        assert!(index.is_empty());
        assert_eq!(index.alias_count(), 0);
        assert_eq!(index.resolve("(注释)"), "(注释)");
    }

    #[test]
    fn test_cap() {
        let mut index = CanonicalIndex::new(2);
        index.admit(Node::new("A", "人"));
        assert!(!index.is_full());
        index.admit(Node::new("B", "人"));
        assert!(index.is_full());
    }

    #[test]
    fn test_entries_follow_registration_order() {
        let mut index = CanonicalIndex::new(10);
        index.admit(Node::new("Beta", "人"));
        index.admit(Node::new("Alpha", "人"));
        index.admit(Node::new("BETA", "组织"));

        let entries: Vec<_> = index
            .into_entries()
            .map(|(key, node)| (key, node.id))
            .collect();
        assert_eq!(
            entries,
            [
                ("beta".to_string(), "Beta".to_string()),
                ("alpha".to_string(), "Alpha".to_string()),
            ]
        );
    }
}
