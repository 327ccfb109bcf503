use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use super::user::user_not_found;
use crate::dtos::{ChatResponse, CreateChatRequest, UpdateChatRequest};
use crate::AppState;

pub(crate) fn chat_not_found(chat_id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Chat {} not found", chat_id))
}

pub async fn list_chats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // An unknown user is a 404, not an empty list.
    if state.store.get_user(user_id).await?.is_none() {
        return Err(user_not_found(user_id));
    }

    let chats = state.store.list_chats(user_id).await?;
    Ok(Json(
        chats.into_iter().map(ChatResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn create_chat(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let chat = state
        .store
        .create_chat(user_id, &req.into_new_chat()?)
        .await?;
    tracing::info!(user_id, chat_id = chat.chat_id, "Chat created");

    Ok((StatusCode::CREATED, Json(ChatResponse::from(chat))))
}

pub async fn get_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let chat = state
        .store
        .get_chat(user_id, chat_id)
        .await?
        .ok_or_else(|| chat_not_found(chat_id))?;

    Ok(Json(ChatResponse::from(chat)))
}

pub async fn update_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(i64, i64)>,
    Json(req): Json<UpdateChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let changes = req.into_changes()?;
    let chat = if changes.is_empty() {
        state.store.get_chat(user_id, chat_id).await?
    } else {
        state.store.update_chat(user_id, chat_id, &changes).await?
    }
    .ok_or_else(|| chat_not_found(chat_id))?;

    Ok(Json(ChatResponse::from(chat)))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    Path((user_id, chat_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_chat(user_id, chat_id).await? {
        return Err(chat_not_found(chat_id));
    }

    tracing::info!(user_id, chat_id, "Chat deleted");
    Ok(StatusCode::NO_CONTENT)
}
