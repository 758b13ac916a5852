//! LLM provider clients.
//!
//! Gemini is called through the Generative Language REST API with a JSON
//! response schema; OpenAI and DeepSeek share the OpenAI-compatible chat
//! completions API in `json_object` mode. Request bodies and response
//! parsing are plain functions over `serde_json::Value` so they can be
//! tested without a network.

use std::fmt;
use std::str::FromStr;

use atlas_core::KnowledgeGraph;
use serde_json::{json, Value};

use crate::config::ProviderSettings;
use crate::decode::decode_graph_text;
use crate::error::{ExtractError, Result};
use crate::pipeline::GraphExtractor;

const PROMPT_TEMPLATE: &str = "从以下文本中提取知识图谱。请识别出所有的实体作为节点，以及它们之间的关系。
确保节点具有唯一的ID（通常是实体的名称）和类型（例如：人、地点、组织、概念）。
如果实体或关系有额外的属性（例如日期、数量、职位、事件描述等），请将它们提取到'properties'字段中。
特别地，如果关系是双向的（例如“合作”“同事”“配偶”），请为每个方向都生成一条关系边（例如 A-合作->B 和 B-合作->A）。
文本: {text}";

/// Chat-completions providers have no response schema, so the expected
/// shape is spelled out in the system message instead.
const JSON_SYSTEM_PROMPT: &str = "You build knowledge graphs. Respond with a single JSON object \
of the form {\"nodes\": [{\"id\": string, \"type\": string, \"properties\": object}], \
\"relationships\": [{\"source\": node, \"target\": node, \"type\": string, \"properties\": object}]} \
and nothing else.";

/// Build the extraction prompt for already-trimmed text.
pub fn build_prompt(text: &str) -> String {
    PROMPT_TEMPLATE.replace("{text}", text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    DeepSeek,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-pro",
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable named in the missing-credentials error.
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(ExtractError::UnknownProvider(other.to_string())),
        }
    }
}

/// Parse a comma-separated provider list. Blank entries are skipped,
/// duplicates keep their first position, and an empty list means Gemini.
pub fn resolve_providers(raw: Option<&str>) -> Result<Vec<ProviderKind>> {
    let mut kinds = Vec::new();
    for token in raw.unwrap_or_default().split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let kind: ProviderKind = token.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        kinds.push(ProviderKind::Gemini);
    }
    Ok(kinds)
}

/// One configured provider endpoint.
#[derive(Clone)]
pub struct ProviderClient {
    kind: ProviderKind,
    model: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl ProviderClient {
    /// `requested_model` (when non-blank) beats the configured model, which
    /// beats the provider default.
    pub fn new(
        kind: ProviderKind,
        settings: &ProviderSettings,
        requested_model: Option<&str>,
        http: reqwest::Client,
    ) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingCredentials {
                provider: kind.to_string(),
                env_var: kind.key_env_var(),
            })?
            .to_string();

        let model = [requested_model, settings.model.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
            .unwrap_or(kind.default_model())
            .to_string();

        let base_url = settings
            .base_url
            .as_deref()
            .unwrap_or(kind.default_base_url())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            kind,
            model,
            api_key,
            base_url,
            http,
        })
    }

    pub fn endpoint(&self) -> String {
        match self.kind {
            ProviderKind::Gemini => {
                format!("{}/models/{}:generateContent", self.base_url, self.model)
            }
            ProviderKind::OpenAi | ProviderKind::DeepSeek => {
                format!("{}/chat/completions", self.base_url)
            }
        }
    }

    pub fn request_body(&self, prompt: &str) -> Value {
        match self.kind {
            ProviderKind::Gemini => gemini_request(prompt),
            ProviderKind::OpenAi | ProviderKind::DeepSeek => chat_request(&self.model, prompt),
        }
    }

    async fn call(&self, prompt: &str) -> Result<KnowledgeGraph> {
        let request = self.http.post(self.endpoint()).json(&self.request_body(prompt));
        let request = match self.kind {
            ProviderKind::Gemini => request.header("x-goog-api-key", &self.api_key),
            ProviderKind::OpenAi | ProviderKind::DeepSeek => request.bearer_auth(&self.api_key),
        };

        tracing::debug!(provider = %self.kind, model = %self.model, "Requesting extraction");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExtractError::Api {
                provider: self.kind.to_string(),
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ExtractError::Decode(format!("response is not JSON: {e}")))?;
        decode_graph_text(&response_text(self.kind, &value)?)
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphExtractor for ProviderClient {
    fn provider(&self) -> &str {
        self.kind.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn extract(&self, prompt: &str) -> impl std::future::Future<Output = Result<KnowledgeGraph>> + Send {
        self.call(prompt)
    }
}

fn gemini_request(prompt: &str) -> Value {
    json!({
        "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        "generationConfig": {
            "temperature": 0,
            "responseMimeType": "application/json",
            "responseSchema": graph_schema(),
        }
    })
}

fn chat_request(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "temperature": 0,
        "response_format": {"type": "json_object"},
        "messages": [
            {"role": "system", "content": JSON_SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ]
    })
}

/// Response schema in the OpenAPI subset Gemini accepts. Properties are
/// requested as key/value pairs since the schema cannot express free-form
/// objects.
pub fn graph_schema() -> Value {
    let properties = json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {"key": {"type": "STRING"}, "value": {"type": "STRING"}},
            "required": ["key", "value"]
        }
    });
    let node = json!({
        "type": "OBJECT",
        "properties": {
            "id": {"type": "STRING"},
            "type": {"type": "STRING"},
            "properties": properties.clone()
        },
        "required": ["id", "type"]
    });
    json!({
        "type": "OBJECT",
        "properties": {
            "nodes": {"type": "ARRAY", "items": node.clone()},
            "relationships": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "source": node.clone(),
                        "target": node,
                        "type": {"type": "STRING"},
                        "properties": properties
                    },
                    "required": ["source", "target", "type"]
                }
            }
        },
        "required": ["nodes", "relationships"]
    })
}

/// Pull the generated text out of a successful response body.
pub fn response_text(kind: ProviderKind, body: &Value) -> Result<String> {
    let text = match kind {
        ProviderKind::Gemini => {
            let parts = body["candidates"][0]["content"]["parts"].as_array();
            parts.map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
        }
        ProviderKind::OpenAi | ProviderKind::DeepSeek => body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string),
    };
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => {
            let reason = body["candidates"][0]["finishReason"]
                .as_str()
                .or_else(|| body["choices"][0]["finish_reason"].as_str())
                .unwrap_or("no content");
            Err(ExtractError::Decode(format!(
                "{kind} returned no text ({reason})"
            )))
        }
    }
}

/// Prefer the structured `error.message` (plus Gemini's `error.status`)
/// over the raw body.
fn api_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let error = &value["error"];
    match (error["status"].as_str(), error["message"].as_str()) {
        (Some(status), Some(message)) => format!("{status}: {message}"),
        (None, Some(message)) => message.to_string(),
        _ => body.trim().to_string(),
    }
}
