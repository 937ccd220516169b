// src/handlers/users.rs
//
// Cadastro de usuários do escritório (somente administradores).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageUsers, RequirePermission},
    },
    models::auth::{CreateUserPayload, UpdateUserPayload, User},
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários cadastrados", body = Vec<User>),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_users()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(users)))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .create_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .user_service
        .update_user(user_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(user)))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário removido"),
        (status = 400, description = "Não é possível remover o próprio usuário"),
        (status = 409, description = "Usuário responsável por contratos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(acting): AuthenticatedUser,
    _guard: RequirePermission<PermManageUsers>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .user_service
        .delete_user(&acting, user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
