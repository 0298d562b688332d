//! AI provider layer for TaskPilot.
//!
//! Normalizes two hosted chat-completion APIs and a rule-based fallback
//! behind the [`AiProvider`] trait. [`ProviderManager`] owns the registered
//! providers, picks the active one, and masks remote failures by retrying
//! structured operations against the rule-based parser.

pub mod config;
pub mod error;
pub mod extract;
pub mod manager;
pub mod minimax;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod rules;

pub use config::AiConfig;
pub use error::{ProviderError, ProviderResult};
pub use manager::ProviderManager;
pub use minimax::{MiniMaxConfig, MiniMaxProvider};
pub use mock::MockProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{AiProvider, CallOptions, CompletionRequest, ProviderKind};
pub use rules::RuleBasedProvider;
