//! Core domain types for extracted knowledge graphs.
//!
//! The same shapes are used for the raw graph returned by an extraction
//! provider and for the sanitized graph handed to downstream consumers
//! (CLI output, Neo4j writer). Only the sanitized form carries the
//! guarantees documented on [`KnowledgeGraph`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Type label given to entities the extractor left untyped.
pub const DEFAULT_NODE_TYPE: &str = "Concept";

/// Type label given to relationships the extractor left untyped.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "RELATED";

/// Free-form attributes attached to a node or relationship.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// ── Nodes ─────────────────────────────────────────────────────────

/// An entity in the knowledge graph.
///
/// `id` is the label chosen by the extractor (usually the entity's name).
/// In a raw graph it is neither unique nor clean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(
        rename = "type",
        default = "default_node_type",
        deserialize_with = "null_as_empty"
    )]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }
}

// ── Relationships ─────────────────────────────────────────────────

/// A directed, typed relationship between two entities.
///
/// Reciprocal relations are expected as two separate edges; nothing in
/// Atlas synthesizes the reverse direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: Node,
    pub target: Node,
    #[serde(
        rename = "type",
        default = "default_relationship_type",
        deserialize_with = "null_as_empty"
    )]
    pub rel_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl Relationship {
    pub fn new(source: Node, target: Node, rel_type: impl Into<String>) -> Self {
        Self {
            source,
            target,
            rel_type: rel_type.into(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }
}

// ── Graph ─────────────────────────────────────────────────────────

/// One canonical entity of a document, keyed by its normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEntityRoot {
    pub name: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub root_type: String,
    #[serde(default)]
    pub key: String,
}

/// A knowledge graph: entities, relationships, and the entity-root index.
///
/// After sanitization:
/// - node ids are pairwise distinct
/// - node and relationship counts respect the configured [`GraphLimits`](crate::GraphLimits)
/// - every relationship endpoint is one of `nodes`
/// - `doc_entity_roots` holds one entry per canonical key, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub doc_entity_roots: Vec<DocEntityRoot>,
}

impl KnowledgeGraph {
    /// Parse a graph from JSON. Fails only when the shape is wrong.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Concatenate several raw graphs, preserving each graph's order.
    ///
    /// Used when more than one extraction provider contributed to the same
    /// document; duplicates are left for the sanitizer to collapse.
    pub fn merge<I>(graphs: I) -> Self
    where
        I: IntoIterator<Item = KnowledgeGraph>,
    {
        let mut merged = KnowledgeGraph::default();
        for graph in graphs {
            merged.nodes.extend(graph.nodes);
            merged.relationships.extend(graph.relationships);
            merged.doc_entity_roots.extend(graph.doc_entity_roots);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

fn default_node_type() -> String {
    DEFAULT_NODE_TYPE.to_string()
}

fn default_relationship_type() -> String {
    DEFAULT_RELATIONSHIP_TYPE.to_string()
}

/// Extractors sometimes emit `"type": null`; treat it as blank so the
/// sanitizer applies its default.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtlasError;

    #[test]
    fn missing_types_get_defaults() {
        let json = r#"{
            "nodes": [{"id": "Marie Curie"}],
            "relationships": [{"source": {"id": "a"}, "target": {"id": "b"}}]
        }"#;
        let graph = KnowledgeGraph::from_json(json).unwrap();
        assert_eq!(graph.nodes[0].node_type, "Concept");
        assert_eq!(graph.relationships[0].rel_type, "RELATED");
        assert!(graph.doc_entity_roots.is_empty());
    }

    #[test]
    fn null_type_is_blank() {
        let json = r#"{"nodes": [{"id": "x", "type": null}], "relationships": []}"#;
        let graph = KnowledgeGraph::from_json(json).unwrap();
        assert_eq!(graph.nodes[0].node_type, "");
    }

    #[test]
    fn type_field_serializes_as_type() {
        let node = Node::new("爱因斯坦", "人");
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"id":"爱因斯坦","type":"人"}"#);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let err = KnowledgeGraph::from_json(r#"{"nodes": [{"name": "x"}]}"#).unwrap_err();
        assert!(matches!(err, AtlasError::Serialization(_)));
    }

    #[test]
    fn merge_concatenates_in_order() {
        let a = KnowledgeGraph {
            nodes: vec![Node::new("A", "人")],
            ..Default::default()
        };
        let b = KnowledgeGraph {
            nodes: vec![Node::new("B", "组织")],
            relationships: vec![Relationship::new(
                Node::new("A", "人"),
                Node::new("B", "组织"),
                "任职",
            )],
            ..Default::default()
        };

        let merged = KnowledgeGraph::merge([a, b]);
        let ids: Vec<_> = merged.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(merged.relationships.len(), 1);
        assert_eq!(merged.relationships[0].target.id, "B");
    }
}
