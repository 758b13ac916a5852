//! Extraction pipeline: prompt every provider, merge, sanitize once.

use std::future::Future;

use atlas_core::{GraphLimits, KnowledgeGraph};
use atlas_sanitize::{sanitize_graph_with_summary, SanitizeSummary};
use serde::Serialize;

use crate::error::{ExtractError, Result};
use crate::provider::build_prompt;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Something that turns a prompt into a raw knowledge graph.
pub trait GraphExtractor {
    /// Provider name recorded in [`ProviderRun`].
    fn provider(&self) -> &str;
    fn model(&self) -> &str;
    fn extract(&self, prompt: &str) -> impl Future<Output = Result<KnowledgeGraph>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Outcome of one provider call, reported next to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRun {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Sanitized graph plus per-provider outcomes. Serializes as the graph's
/// fields with a `provider_runs` array alongside.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    #[serde(flatten)]
    pub graph: KnowledgeGraph,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_runs: Vec<ProviderRun>,
    #[serde(skip)]
    pub summary: SanitizeSummary,
}

/// Run `text` through every extractor in order and reconcile the union of
/// their raw graphs.
///
/// A failing provider is recorded and skipped. With a single extractor its
/// error is returned as-is; with several, the call fails only when all of
/// them do.
pub async fn extract_knowledge_graph<E: GraphExtractor>(
    text: &str,
    extractors: &[E],
    limits: &GraphLimits,
    retry: &RetryPolicy,
) -> Result<ExtractionReport> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyInput);
    }
    if extractors.is_empty() {
        return Err(ExtractError::AllProvidersFailed(
            "no provider configured".into(),
        ));
    }

    let prompt = build_prompt(text);
    let mut raw_graphs = Vec::new();
    let mut runs = Vec::new();
    let mut last_error = None;

    for extractor in extractors {
        let provider = extractor.provider();
        match retry_with_backoff(retry, || extractor.extract(&prompt)).await {
            Ok(graph) => {
                tracing::info!(
                    provider,
                    model = extractor.model(),
                    nodes = graph.nodes.len(),
                    relationships = graph.relationships.len(),
                    "Provider extraction succeeded"
                );
                raw_graphs.push(graph);
                runs.push(ProviderRun {
                    provider: provider.to_string(),
                    model: Some(extractor.model().to_string()),
                    status: RunStatus::Success,
                    message: None,
                });
            }
            Err(e) => {
                tracing::warn!(provider, error = %e, "Provider extraction failed");
                runs.push(ProviderRun {
                    provider: provider.to_string(),
                    model: Some(extractor.model().to_string()),
                    status: RunStatus::Error,
                    message: Some(e.to_string()),
                });
                last_error = Some(e);
            }
        }
    }

    if raw_graphs.is_empty() {
        return Err(match (extractors.len(), last_error) {
            (1, Some(e)) => e,
            _ => ExtractError::AllProvidersFailed(
                runs.iter()
                    .map(|r| {
                        format!(
                            "{}: {}",
                            r.provider,
                            r.message.as_deref().unwrap_or("unknown error")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        });
    }

    let merged = KnowledgeGraph::merge(raw_graphs);
    let (graph, summary) = sanitize_graph_with_summary(merged, limits);
    Ok(ExtractionReport {
        graph,
        provider_runs: runs,
        summary,
    })
}
