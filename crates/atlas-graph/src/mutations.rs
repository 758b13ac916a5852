//! Write operations for sanitized knowledge graphs.
//!
//! All writes use MERGE so re-importing the same document is idempotent.
//! Entities are keyed by name (the canonical id); properties are stored as
//! a JSON string because Neo4j properties cannot hold nested maps.

use atlas_core::{KnowledgeGraph, Node, Properties, Relationship};
use chrono::Utc;
use neo4rs::{query, Query};
use serde::Serialize;

use crate::client::{GraphClient, GraphError};

/// What a [`GraphClient::write_graph`] call wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub entities: usize,
    pub relationships: usize,
    pub doc_links: usize,
}

impl GraphClient {
    /// Upsert a single entity node.
    pub async fn upsert_entity(&self, node: &Node) -> Result<(), GraphError> {
        self.run(entity_query(node, &Utc::now().to_rfc3339())?).await
    }

    /// Upsert a single relationship. Both endpoints must already exist.
    pub async fn upsert_relationship(&self, rel: &Relationship) -> Result<(), GraphError> {
        self.run(relationship_query(rel, &Utc::now().to_rfc3339())?)
            .await
    }

    /// Link a document to the entity roots of its sanitized graph.
    pub async fn link_doc_entities(
        &self,
        doc_id: &str,
        graph: &KnowledgeGraph,
    ) -> Result<usize, GraphError> {
        let now = Utc::now().to_rfc3339();
        let mut txn = self.start_txn().await?;
        txn.run(doc_query(doc_id, &now)).await?;
        for root in &graph.doc_entity_roots {
            txn.run(doc_link_query(doc_id, &root.name, &root.key)).await?;
        }
        txn.commit().await?;
        Ok(graph.doc_entity_roots.len())
    }

    /// Write a whole sanitized graph in one transaction.
    ///
    /// With a `doc_id`, the document node is merged and linked to every entry
    /// of `doc_entity_roots`.
    pub async fn write_graph(
        &self,
        doc_id: Option<&str>,
        graph: &KnowledgeGraph,
    ) -> Result<WriteSummary, GraphError> {
        let now = Utc::now().to_rfc3339();
        let mut summary = WriteSummary::default();
        let mut txn = self.start_txn().await?;

        for node in &graph.nodes {
            txn.run(entity_query(node, &now)?).await?;
            summary.entities += 1;
        }

        for rel in &graph.relationships {
            txn.run(relationship_query(rel, &now)?).await?;
            summary.relationships += 1;
        }

        if let Some(doc_id) = doc_id {
            txn.run(doc_query(doc_id, &now)).await?;
            for root in &graph.doc_entity_roots {
                txn.run(doc_link_query(doc_id, &root.name, &root.key))
                    .await?;
                summary.doc_links += 1;
            }
        }

        txn.commit().await?;

        tracing::info!(
            doc_id = ?doc_id,
            entities = summary.entities,
            relationships = summary.relationships,
            doc_links = summary.doc_links,
            "Wrote knowledge graph to Neo4j"
        );
        Ok(summary)
    }
}

// ── Query builders ───────────────────────────────────────────────

fn entity_query(node: &Node, now: &str) -> Result<Query, GraphError> {
    Ok(query(
        "MERGE (e:Entity {name: $name})
         ON CREATE SET e.first_seen = $now
         SET e.type = $type, e.properties = $properties, e.last_seen = $now",
    )
    .param("name", node.id.clone())
    .param("type", node.node_type.clone())
    .param("properties", properties_json(&node.properties)?)
    .param("now", now.to_string()))
}

fn relationship_query(rel: &Relationship, now: &str) -> Result<Query, GraphError> {
    Ok(query(
        "MATCH (src:Entity {name: $source})
         MATCH (dst:Entity {name: $target})
         MERGE (src)-[r:RELATED {relation: $relation}]->(dst)
         ON CREATE SET r.first_seen = $now
         SET r.properties = $properties, r.last_seen = $now",
    )
    .param("source", rel.source.id.clone())
    .param("target", rel.target.id.clone())
    .param("relation", rel.rel_type.clone())
    .param("properties", properties_json(&rel.properties)?)
    .param("now", now.to_string()))
}

fn doc_query(doc_id: &str, now: &str) -> Query {
    query(
        "MERGE (d:Doc {id: $doc_id})
         ON CREATE SET d.first_seen = $now
         SET d.last_seen = $now",
    )
    .param("doc_id", doc_id.to_string())
    .param("now", now.to_string())
}

fn doc_link_query(doc_id: &str, name: &str, key: &str) -> Query {
    query(
        "MATCH (d:Doc {id: $doc_id})
         MATCH (e:Entity {name: $name})
         MERGE (d)-[h:HAS_ENTITY]->(e)
         SET h.key = $key",
    )
    .param("doc_id", doc_id.to_string())
    .param("name", name.to_string())
    .param("key", key.to_string())
}

/// Encode optional properties as a JSON object string (`{}` when absent).
pub(crate) fn properties_json(properties: &Option<Properties>) -> Result<String, GraphError> {
    match properties {
        Some(map) => {
            serde_json::to_string(map).map_err(|e| GraphError::Serialization(e.to_string()))
        }
        None => Ok("{}".to_string()),
    }
}
