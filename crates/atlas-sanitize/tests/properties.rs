//! Property tests for the invariants every sanitized graph must satisfy.

use std::collections::HashSet;

use atlas_core::{GraphLimits, KnowledgeGraph, Node, Relationship};
use atlas_sanitize::{resolve_type, sanitize_graph, type_rank};
use proptest::prelude::*;

const ID_POOL: &[&str] = &[
    "Marie Curie",
    "marie curie",
    "MARIE-CURIE（physicist）",
    "爱因斯坦",
    "Einstein",
    "Chapter 3",
    "第二章",
    "Section-1",
    "Partner",
    "docs/readme",
    "(annotation only)",
    "  Kafka ",
    "kafka",
    "",
    "A",
    "a",
    "B",
];

const TYPE_POOL: &[&str] = &[
    "", "Concept", "人", "组织", "事件", "技术", "产品", "chapter", "Spaceship", "person",
];

const REL_TYPE_POOL: &[&str] = &["", "同事", " RELATED ", "含有"];

fn arb_id() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(ID_POOL).prop_map(String::from),
        1 => "[a-zA-Z0-9 ()（）第章#_-]{0,10}",
    ]
}

fn arb_type() -> impl Strategy<Value = String> {
    prop::sample::select(TYPE_POOL).prop_map(String::from)
}

fn arb_node() -> impl Strategy<Value = Node> {
    (arb_id(), arb_type()).prop_map(|(id, t)| Node::new(id, t))
}

fn arb_relationship() -> impl Strategy<Value = Relationship> {
    (arb_node(), arb_node(), prop::sample::select(REL_TYPE_POOL))
        .prop_map(|(s, t, r)| Relationship::new(s, t, r))
}

fn arb_graph() -> impl Strategy<Value = KnowledgeGraph> {
    (
        prop::collection::vec(arb_node(), 0..40),
        prop::collection::vec(arb_relationship(), 0..60),
    )
        .prop_map(|(nodes, relationships)| KnowledgeGraph {
            nodes,
            relationships,
            doc_entity_roots: Vec::new(),
        })
}

fn arb_limits() -> impl Strategy<Value = GraphLimits> {
    (0usize..20, 0usize..30).prop_map(|(n, r)| GraphLimits::new(n, r))
}

proptest! {
    #[test]
    fn caps_are_respected(raw in arb_graph(), limits in arb_limits()) {
        let graph = sanitize_graph(raw, &limits);
        prop_assert!(graph.nodes.len() <= limits.max_graph_nodes);
        prop_assert!(graph.relationships.len() <= limits.max_graph_relationships);
    }

    #[test]
    fn node_ids_are_distinct(raw in arb_graph(), limits in arb_limits()) {
        let graph = sanitize_graph(raw, &limits);
        let ids: HashSet<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(ids.len(), graph.nodes.len());
    }

    #[test]
    fn relationships_reference_output_nodes(raw in arb_graph(), limits in arb_limits()) {
        let graph = sanitize_graph(raw, &limits);
        let ids: HashSet<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for rel in &graph.relationships {
            prop_assert!(ids.contains(rel.source.id.as_str()));
            prop_assert!(ids.contains(rel.target.id.as_str()));
        }
    }

    #[test]
    fn one_root_per_node(raw in arb_graph(), limits in arb_limits()) {
        let graph = sanitize_graph(raw, &limits);
        prop_assert_eq!(graph.doc_entity_roots.len(), graph.nodes.len());
        let keys: HashSet<_> = graph.doc_entity_roots.iter().map(|r| r.key.as_str()).collect();
        prop_assert_eq!(keys.len(), graph.doc_entity_roots.len());
        for (root, node) in graph.doc_entity_roots.iter().zip(&graph.nodes) {
            prop_assert_eq!(&root.name, &node.id);
            prop_assert_eq!(&root.root_type, &node.node_type);
        }
    }

    #[test]
    fn sanitizing_twice_changes_nothing(raw in arb_graph(), limits in arb_limits()) {
        let once = sanitize_graph(raw, &limits);
        let twice = sanitize_graph(once.clone(), &limits);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merged_type_rank_never_decreases(types in prop::collection::vec(arb_type(), 1..12)) {
        let mut current = types[0].clone();
        for candidate in &types[1..] {
            let before = type_rank(&current);
            current = resolve_type(&current, candidate).to_string();
            prop_assert!(type_rank(&current) >= before);
        }
    }
}
