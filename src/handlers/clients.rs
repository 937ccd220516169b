// src/handlers/clients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        period::MonthQuery,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermDeleteClients, PermManageClients, RequirePermission},
    },
    models::client::{
        Client, ClientDetail, ClientListQuery, ClientSummary, CreateClientPayload, HistoryQuery,
        LifecyclePayload, ResetSchedulePayload, UpdateClientPayload,
    },
};

// =============================================================================
//  CONTRATOS
// =============================================================================

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Contrato criado com o cronograma de parcelas", body = ClientDetail),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .client_service
        .create_client(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ClientListQuery),
    responses(
        (status = 200, description = "Contratos ativos com status calculado", body = Vec<ClientSummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Query(query): Query<ClientListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .client_service
        .list_clients(&user, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// GET /api/clients/history
#[utoipa::path(
    get,
    path = "/api/clients/history",
    tag = "Clients",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Contratos rescindidos ou suspensos no mês", body = Vec<Client>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn client_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = MonthQuery { year: query.year, month: query.month }
        .window()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let clients = app_state
        .client_service
        .history(&user, query.kind, &window)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Contrato, parcelas e indicadores", body = ClientDetail),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .client_service
        .get_client(&user, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    request_body = UpdateClientPayload,
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Contrato atualizado", body = ClientDetail),
        (status = 404, description = "Contrato não encontrado"),
        (status = 409, description = "Alteração de cronograma exige redefinição")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .client_service
        .update_client(&user, client_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/clients/{id}/reset-schedule
#[utoipa::path(
    post,
    path = "/api/clients/{id}/reset-schedule",
    tag = "Clients",
    request_body = ResetSchedulePayload,
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Cronograma regenerado; pagamentos anteriores descartados", body = ClientDetail),
        (status = 400, description = "Redefinição não confirmada ou termos inválidos"),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reset_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<ResetSchedulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .client_service
        .reset_schedule(&user, client_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 204, description = "Contrato e parcelas removidos"),
        (status = 403, description = "Sem permissão"),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermDeleteClients>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .client_service
        .delete_client(&user, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CICLO DE VIDA
// =============================================================================

// POST /api/clients/{id}/terminate
#[utoipa::path(
    post,
    path = "/api/clients/{id}/terminate",
    tag = "Clients",
    request_body = LifecyclePayload,
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Contrato rescindido", body = Client),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn terminate_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<LifecyclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .terminate_client(&user, client_id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/suspend
#[utoipa::path(
    post,
    path = "/api/clients/{id}/suspend",
    tag = "Clients",
    request_body = LifecyclePayload,
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Contrato suspenso", body = Client),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn suspend_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<LifecyclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .suspend_client(&user, client_id, &payload.reason)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/reactivate
#[utoipa::path(
    post,
    path = "/api/clients/{id}/reactivate",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Contrato reativado", body = Client),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reactivate_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .client_service
        .reactivate_client(&user, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}
