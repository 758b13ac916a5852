//! Provider response bodies through decoding and reconciliation.

use atlas_core::GraphLimits;
use atlas_extract::decode::decode_graph_text;
use atlas_extract::provider::{response_text, ProviderKind};
use atlas_sanitize::sanitize_graph;
use serde_json::json;

fn gemini_body(graph: serde_json::Value) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": graph.to_string()}]},
            "finishReason": "STOP"
        }]
    })
}

#[test]
fn gemini_key_value_output_is_reconciled() {
    let body = gemini_body(json!({
        "nodes": [
            {"id": "Marie Curie", "type": "Concept",
             "properties": [{"key": "type", "value": "人"}, {"key": "born", "value": "1867"}]},
            {"id": "marie curie（physicist）", "type": "Concept", "properties": []},
            {"id": "Warsaw", "type": "地点", "properties": []},
            {"id": "第一章", "type": "Concept", "properties": []}
        ],
        "relationships": [
            {"source": {"id": "marie curie（physicist）", "type": "Concept"},
             "target": {"id": "Warsaw", "type": "地点"},
             "type": "出生于",
             "properties": [{"key": "year", "value": "1867"}]},
            {"source": {"id": "第一章", "type": "Concept"},
             "target": {"id": "Warsaw", "type": "地点"},
             "type": "提及"}
        ]
    }));

    let text = response_text(ProviderKind::Gemini, &body).unwrap();
    let graph = sanitize_graph(decode_graph_text(&text).unwrap(), &GraphLimits::default());

    let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["Marie Curie", "Warsaw"]);
    assert_eq!(graph.nodes[0].node_type, "人");
    assert_eq!(graph.nodes[0].properties.as_ref().unwrap()["born"], 1867);

    assert_eq!(graph.relationships.len(), 1);
    let rel = &graph.relationships[0];
    assert_eq!(rel.source.id, "Marie Curie");
    assert_eq!(rel.source.node_type, "人");
    assert_eq!(rel.properties.as_ref().unwrap()["year"], 1867);

    let keys: Vec<_> = graph.doc_entity_roots.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["mariecurie", "warsaw"]);
}

#[test]
fn fenced_chat_output_is_reconciled() {
    let content = "```json\n{\"nodes\": [{\"id\": \"Kafka\", \"type\": \"技术\"}, \
                   {\"id\": \"kafka\", \"type\": \"Concept\", \"properties\": \"{\\\"since\\\": 2011}\"}], \
                   \"relationships\": []}\n```";
    let body = json!({"choices": [{"message": {"role": "assistant", "content": content}}]});

    let text = response_text(ProviderKind::DeepSeek, &body).unwrap();
    let graph = sanitize_graph(decode_graph_text(&text).unwrap(), &GraphLimits::default());

    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, "Kafka");
    assert_eq!(graph.nodes[0].node_type, "技术");
    // The duplicate's properties do not survive the merge.
    assert!(graph.nodes[0].properties.is_none());
}

#[test]
fn empty_candidate_is_a_decode_error() {
    let body = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "MAX_TOKENS"}]});
    let err = response_text(ProviderKind::Gemini, &body).unwrap_err();
    assert!(err.to_string().contains("MAX_TOKENS"));
}
