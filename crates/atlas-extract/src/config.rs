//! Layered configuration for the extractor.
//!
//! Sources, lowest precedence first: serde defaults, an optional config file
//! (`atlas.toml` by default), `ATLAS__*` environment variables, then the
//! flat legacy variables (`GEMINI_API_KEY`, `GEMINI_MAX_GRAPH_NODES`, ...).

use atlas_core::GraphLimits;
use atlas_graph::GraphConfig;
use serde::Deserialize;

use crate::error::Result;
use crate::provider::ProviderKind;
use crate::retry::RetryPolicy;

/// Flat environment variables and the config keys they set. Later entries
/// win, so `GEMINI_API_KEY` beats `GOOGLE_API_KEY`.
const LEGACY_ENV: &[(&str, &str, ValueKind)] = &[
    ("GEMINI_MAX_GRAPH_NODES", "limits.max_graph_nodes", ValueKind::Integer),
    (
        "GEMINI_MAX_GRAPH_RELATIONSHIPS",
        "limits.max_graph_relationships",
        ValueKind::Integer,
    ),
    ("GOOGLE_API_KEY", "gemini.api_key", ValueKind::Text),
    ("GEMINI_API_KEY", "gemini.api_key", ValueKind::Text),
    ("GEMINI_DEFAULT_MODEL", "gemini.model", ValueKind::Text),
    ("OPENAI_API_KEY", "openai.api_key", ValueKind::Text),
    ("OPENAI_DEFAULT_MODEL", "openai.model", ValueKind::Text),
    ("DEEPSEEK_API_KEY", "deepseek.api_key", ValueKind::Text),
    ("DEEPSEEK_MODEL", "deepseek.model", ValueKind::Text),
    ("DEEPSEEK_API_BASE", "deepseek.base_url", ValueKind::Text),
    ("GRAPH_EXTRACTOR_PROVIDER", "providers", ValueKind::Text),
    ("GRAPH_EXTRACTOR_PROVIDERS", "providers", ValueKind::Text),
];

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AtlasConfig {
    #[serde(default)]
    pub limits: GraphLimits,
    /// Comma-separated provider list; Gemini when unset.
    #[serde(default)]
    pub providers: Option<String>,
    #[serde(default)]
    pub gemini: ProviderSettings,
    #[serde(default)]
    pub openai: ProviderSettings,
    #[serde(default)]
    pub deepseek: ProviderSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub neo4j: Neo4jSettings,
}

impl AtlasConfig {
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::DeepSeek => &self.deepseek,
        }
    }
}

/// Per-provider settings. Unset fields fall back to the provider's defaults
/// in [`ProviderKind`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_neo4j_uri")]
    pub uri: String,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    #[serde(default = "default_neo4j_password")]
    pub password: String,
    #[serde(default)]
    pub database: Option<String>,
}

fn default_neo4j_uri() -> String {
    GraphConfig::default().uri
}
fn default_neo4j_user() -> String {
    GraphConfig::default().user
}
fn default_neo4j_password() -> String {
    GraphConfig::default().password
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_neo4j_uri(),
            user: default_neo4j_user(),
            password: default_neo4j_password(),
            database: None,
        }
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(s: &Neo4jSettings) -> Self {
        GraphConfig {
            uri: s.uri.clone(),
            user: s.user.clone(),
            password: s.password.clone(),
            database: s.database.clone(),
            ..Default::default()
        }
    }
}

/// Load configuration from `file_prefix` (any extension `config` knows)
/// and the process environment.
pub fn load_config(file_prefix: &str) -> Result<AtlasConfig> {
    load_config_with(file_prefix, |name| std::env::var(name).ok())
}

/// Like [`load_config`], reading legacy variables through `lookup`.
pub fn load_config_with<F>(file_prefix: &str, lookup: F) -> Result<AtlasConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("ATLAS")
                .separator("__")
                .try_parsing(true),
        );

    for &(var, key, kind) in LEGACY_ENV {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let raw = raw.trim();
        builder = match kind {
            ValueKind::Text => builder.set_override(key, raw)?,
            ValueKind::Integer => {
                let n: i64 = raw.parse().map_err(|_| {
                    config::ConfigError::Message(format!("{var} must be an integer, got {raw:?}"))
                })?;
                builder.set_override(key, n)?
            }
        };
    }

    let cfg = builder.build()?.try_deserialize::<AtlasConfig>()?;
    tracing::debug!(
        max_nodes = cfg.limits.max_graph_nodes,
        max_relationships = cfg.limits.max_graph_relationships,
        providers = ?cfg.providers,
        "Loaded configuration"
    );
    Ok(cfg)
}
