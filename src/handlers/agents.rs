// src/handlers/agents.rs

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
        rbac::{PermManageAgents, RequirePermission},
    },
    models::agent::{AgentView, CreateAgentPayload, ToggleAgentInstallmentPayload, UpdateAgentPayload},
};

// POST /api/agents
#[utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentPayload,
    responses(
        (status = 201, description = "Agente cadastrado", body = AgentView),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
    Json(payload): Json<CreateAgentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agent = app_state
        .agent_service
        .create_agent(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(agent)))
}

// GET /api/agents
#[utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses((status = 200, description = "Agentes com o calendário de parcelas", body = Vec<AgentView>)),
    security(("api_jwt" = []))
)]
pub async fn list_agents(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
) -> Result<impl IntoResponse, ApiError> {
    let agents = app_state
        .agent_service
        .list_agents(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(agents)))
}

// GET /api/agents/{id}
#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 200, description = "Agente", body = AgentView),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
    Path(agent_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let agent = app_state
        .agent_service
        .get_agent(&user, agent_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(agent)))
}

// PUT /api/agents/{id}
#[utoipa::path(
    put,
    path = "/api/agents/{id}",
    tag = "Agents",
    request_body = UpdateAgentPayload,
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 200, description = "Agente atualizado", body = AgentView),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
    Path(agent_id): Path<Uuid>,
    Json(payload): Json<UpdateAgentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agent = app_state
        .agent_service
        .update_agent(&user, agent_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(agent)))
}

// POST /api/agents/{id}/installments
#[utoipa::path(
    post,
    path = "/api/agents/{id}/installments",
    tag = "Agents",
    request_body = ToggleAgentInstallmentPayload,
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 200, description = "Parcela do agente marcada ou desmarcada", body = AgentView),
        (status = 400, description = "Parcela inexistente"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_installment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
    Path(agent_id): Path<Uuid>,
    Json(payload): Json<ToggleAgentInstallmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agent = app_state
        .agent_service
        .toggle_installment(&user, agent_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(agent)))
}

// DELETE /api/agents/{id}
#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    tag = "Agents",
    params(("id" = Uuid, Path, description = "ID do agente")),
    responses(
        (status = 204, description = "Agente removido"),
        (status = 404, description = "Agente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_agent(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageAgents>,
    Path(agent_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .agent_service
        .delete_agent(&user, agent_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
