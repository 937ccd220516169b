// src/handlers/bonuses.rs

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
        rbac::{PermManageBonusRules, PermViewBonuses, RequirePermission},
    },
    models::bonus::{BonusQuery, BonusRule, CreateBonusRulePayload, EmployeeBonus},
};

// =============================================================================
//  REGRAS
// =============================================================================

// POST /api/bonuses/rules
#[utoipa::path(
    post,
    path = "/api/bonuses/rules",
    tag = "Bonuses",
    request_body = CreateBonusRulePayload,
    responses(
        (status = 201, description = "Regra criada", body = BonusRule),
        (status = 400, description = "Informe funcionário ou papel (apenas um)")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageBonusRules>,
    Json(payload): Json<CreateBonusRulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let rule = app_state
        .bonus_service
        .create_rule(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(rule)))
}

// GET /api/bonuses/rules
#[utoipa::path(
    get,
    path = "/api/bonuses/rules",
    tag = "Bonuses",
    responses((status = 200, description = "Regras cadastradas", body = Vec<BonusRule>)),
    security(("api_jwt" = []))
)]
pub async fn list_rules(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageBonusRules>,
) -> Result<impl IntoResponse, ApiError> {
    let rules = app_state
        .bonus_service
        .list_rules()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(rules)))
}

// DELETE /api/bonuses/rules/{id}
#[utoipa::path(
    delete,
    path = "/api/bonuses/rules/{id}",
    tag = "Bonuses",
    params(("id" = Uuid, Path, description = "ID da regra")),
    responses(
        (status = 204, description = "Regra removida"),
        (status = 404, description = "Regra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageBonusRules>,
    Path(rule_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .bonus_service
        .delete_rule(rule_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  APURAÇÃO
// =============================================================================

// POST /api/bonuses/compute
#[utoipa::path(
    post,
    path = "/api/bonuses/compute",
    tag = "Bonuses",
    params(BonusQuery),
    responses(
        (status = 200, description = "Bônus apurados no mês", body = Vec<EmployeeBonus>),
        (status = 404, description = "Funcionário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn compute_bonuses(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageBonusRules>,
    Query(query): Query<BonusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = MonthQuery { year: query.year, month: query.month }
        .window()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let bonuses = app_state
        .bonus_service
        .compute_bonuses(window, query.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(bonuses)))
}

// GET /api/bonuses
#[utoipa::path(
    get,
    path = "/api/bonuses",
    tag = "Bonuses",
    params(BonusQuery),
    responses((status = 200, description = "Bônus apurados", body = Vec<EmployeeBonus>)),
    security(("api_jwt" = []))
)]
pub async fn list_bonuses(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermViewBonuses>,
    Query(query): Query<BonusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bonuses = app_state
        .bonus_service
        .list_bonuses(&user, query.year, query.month, query.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(bonuses)))
}
