use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::models::{NewUser, UserChanges};
use crate::AppState;

pub(crate) fn user_not_found(user_id: i64) -> AppError {
    AppError::NotFound(anyhow::anyhow!("User {} not found", user_id))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state.store.create_user(&NewUser::from(req)).await?;
    tracing::info!(user_id = user.user_id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let changes = UserChanges::from(req);
    let user = if changes.is_empty() {
        state.store.get_user(user_id).await?
    } else {
        state.store.update_user(user_id, &changes).await?
    }
    .ok_or_else(|| user_not_found(user_id))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_user(user_id).await? {
        return Err(user_not_found(user_id));
    }

    tracing::info!(user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
