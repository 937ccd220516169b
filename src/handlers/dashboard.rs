// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::ApiError,
        period::{MonthQuery, MonthWindow},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSyncMetrics, PermViewOwnMetrics, RequirePermission},
    },
    models::dashboard::{MetricsQuery, MonthlyMetrics, YearOverview},
};

// GET /api/dashboard/metrics
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "Dashboard",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Indicadores do mês (zerados se a carga falhar)", body = MonthlyMetrics),
        (status = 400, description = "Período inválido"),
        (status = 403, description = "Carteira de outro funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_monthly_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermViewOwnMetrics>,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = MonthQuery { year: query.year, month: query.month }
        .window()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Sem metrics:company, só a própria carteira
    let metrics = app_state
        .dashboard_service
        .monthly_metrics(&user, window, query.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(metrics)))
}

// GET /api/dashboard/year
#[utoipa::path(
    get,
    path = "/api/dashboard/year",
    tag = "Dashboard",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Indicadores dos doze meses do ano", body = YearOverview),
        (status = 400, description = "Período inválido"),
        (status = 403, description = "Carteira de outro funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_year_overview(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermViewOwnMetrics>,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let year = query.year.unwrap_or_else(|| MonthWindow::current().year);

    let overview = app_state
        .dashboard_service
        .year_overview(&user, year, query.employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(overview)))
}

// POST /api/dashboard/sync
#[utoipa::path(
    post,
    path = "/api/dashboard/sync",
    tag = "Dashboard",
    params(MonthQuery),
    responses(
        (status = 202, description = "Indicadores calculados e enviados ao webhook", body = MonthlyMetrics),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn sync_metrics(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermSyncMetrics>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let window = query
        .window()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let metrics = app_state.dashboard_service.sync_metrics(&user, window).await;

    Ok((StatusCode::ACCEPTED, Json(metrics)))
}
