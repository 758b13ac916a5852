//! Read operations over persisted knowledge graphs.

use atlas_core::DocEntityRoot;
use neo4rs::query;

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    /// Entity roots linked to a document, ordered by name.
    pub async fn document_entities(&self, doc_id: &str) -> Result<Vec<DocEntityRoot>, GraphError> {
        let q = query(
            "MATCH (:Doc {id: $doc_id})-[h:HAS_ENTITY]->(e:Entity)
             RETURN e.name AS name, e.type AS type, h.key AS key
             ORDER BY name",
        )
        .param("doc_id", doc_id.to_string());

        let rows = self.query_rows(q).await?;
        rows.iter()
            .map(|row| {
                Ok(DocEntityRoot {
                    name: row
                        .get::<String>("name")
                        .map_err(|e| GraphError::Serialization(e.to_string()))?,
                    root_type: row.get::<String>("type").unwrap_or_default(),
                    key: row.get::<String>("key").unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Outgoing relation types of an entity, as `(relation, target)` pairs.
    pub async fn entity_relations(&self, name: &str) -> Result<Vec<(String, String)>, GraphError> {
        let q = query(
            "MATCH (:Entity {name: $name})-[r:RELATED]->(dst:Entity)
             RETURN r.relation AS relation, dst.name AS target
             ORDER BY relation, target",
        )
        .param("name", name.to_string());

        let rows = self.query_rows(q).await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let relation = row.get::<String>("relation").ok()?;
                let target = row.get::<String>("target").ok()?;
                Some((relation, target))
            })
            .collect())
    }
}
