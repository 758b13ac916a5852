//! Size limits for sanitized graphs.
//!
//! Limits are read once at process start (see `atlas-extract`'s config
//! loader, which honours `GEMINI_MAX_GRAPH_NODES` and
//! `GEMINI_MAX_GRAPH_RELATIONSHIPS`) and passed explicitly into the
//! sanitizer. Nothing here is global or mutable.

use serde::Deserialize;

/// Caps applied while reconciling a raw graph.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct GraphLimits {
    /// Maximum number of canonical nodes in the output graph.
    #[serde(default = "default_max_nodes")]
    pub max_graph_nodes: usize,

    /// Maximum number of relationships in the output graph.
    #[serde(default = "default_max_relationships")]
    pub max_graph_relationships: usize,
}

impl GraphLimits {
    pub fn new(max_graph_nodes: usize, max_graph_relationships: usize) -> Self {
        Self {
            max_graph_nodes,
            max_graph_relationships,
        }
    }
}

fn default_max_nodes() -> usize {
    50
}

fn default_max_relationships() -> usize {
    100
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_graph_nodes: default_max_nodes(),
            max_graph_relationships: default_max_relationships(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = GraphLimits::default();
        assert_eq!(limits.max_graph_nodes, 50);
        assert_eq!(limits.max_graph_relationships, 100);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let limits: GraphLimits = serde_json::from_str(r#"{"max_graph_nodes": 7}"#).unwrap();
        assert_eq!(limits, GraphLimits::new(7, 100));
    }
}
