//! Provider configuration.

use serde::Deserialize;

use crate::minimax::MiniMaxConfig;
use crate::openai::OpenAiConfig;

/// Configuration for every natural-language backend.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// `auto` or a provider name (`openai`, `minimax`, `simple`).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub minimax: MiniMaxConfig,
    /// Per-request timeout for remote adapters.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "auto".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai: OpenAiConfig::default(),
            minimax: MiniMaxConfig::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.openai.api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("OPENAI_BASE_URL") {
            config.openai.base_url = url;
        }

        config.minimax.api_key = get("MINIMAX_API_KEY");
        if let Some(group) = get("MINIMAX_API_GROUP") {
            config.minimax.api_group = group;
        }
        if let Some(url) = get("MINIMAX_BASE_URL") {
            config.minimax.base_url = url;
        }

        if let Some(provider) = get("AI_PROVIDER") {
            config.provider = provider;
        }
        match get("AI_TIMEOUT_SECS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.timeout_secs = secs,
            Some(_) => tracing::warn!("ignoring invalid AI_TIMEOUT_SECS"),
            None => {}
        }

        config
    }
}
