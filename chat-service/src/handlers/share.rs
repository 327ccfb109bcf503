use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use super::chat::chat_not_found;
use crate::dtos::{ChatResponse, ShareRequest, ShareResponse};
use crate::services::CapabilityError;
use crate::AppState;

/// Path under which share tokens are redeemed.
pub const SHARE_PATH_PREFIX: &str = "/api/v1/chat";

/// Mint a share token for one of the user's chats.
///
/// The body is optional; an empty body uses the configured default lifetime.
pub async fn share_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let req: ShareRequest = if body.is_empty() {
        ShareRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e)))?
    };
    req.validate()?;

    state
        .store
        .get_chat(user_id, chat_id)
        .await?
        .ok_or_else(|| chat_not_found(chat_id))?;

    let ttl = req
        .ttl_seconds
        .map(|seconds| state.capabilities.ttl_from_seconds(seconds))
        .unwrap_or_else(|| state.capabilities.default_ttl());
    let issued = state.capabilities.issue(chat_id, ttl)?;

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            url: format!("{}/{}", SHARE_PATH_PREFIX, issued.token),
            expires_in: issued.expires_in(),
            chat_id: issued.chat_id,
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
            token: issued.token,
        }),
    ))
}

/// Exchange a share token for the chat it names.
///
/// Every token problem answers `401 Unauthorized` with no further detail.
pub async fn redeem_shared_chat(
    State(state): State<AppState>,
    token: Result<Path<String>, PathRejection>,
) -> Result<Json<ChatResponse>, CapabilityError> {
    let Path(token) = token.map_err(|e| CapabilityError::Malformed(e.body_text()))?;

    let chat = state
        .capabilities
        .redeem(&token, state.store.as_ref())
        .await?;

    Ok(Json(ChatResponse::from(chat)))
}
