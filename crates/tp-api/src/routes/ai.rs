//! Provider introspection, switching and raw completion endpoints.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use tp_ai::CallOptions;
use tp_protocol::{ChatMessage, Completion, ProviderInfo};

#[derive(Debug, Deserialize)]
pub struct SwitchProviderRequest {
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub active: String,
    pub providers: Vec<ProviderInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub options: CallOptions,
}

/// GET /api/ai/provider: the active provider.
pub async fn get_provider(State(state): State<AppState>) -> Json<ProviderInfo> {
    Json(state.ai.provider_info().await)
}

/// PUT /api/ai/provider: switch the active provider.
///
/// Unknown names select the rule-based provider rather than failing.
pub async fn switch_provider(
    State(state): State<AppState>,
    Json(req): Json<SwitchProviderRequest>,
) -> ApiResult<Json<ProviderInfo>> {
    let name = req
        .provider
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("provider is required".into()))?;
    Ok(Json(state.ai.switch_provider(&name).await))
}

/// GET /api/ai/providers: every available provider.
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        active: state.ai.provider_info().await.name,
        providers: state.ai.available_providers(),
    })
}

/// POST /api/ai/complete: raw chat completion, no fallback.
pub async fn complete(
    State(state): State<AppState>,
    Json(req): Json<CompleteRequest>,
) -> ApiResult<Json<Completion>> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("messages are required".into()));
    }
    let completion = state.ai.complete(req.messages, &req.options).await?;
    Ok(Json(completion))
}
