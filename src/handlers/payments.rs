// src/handlers/payments.rs
//
// Parcelas de um contrato. Toda alteração devolve a parcela e os totais
// recalculados do contrato.

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
        rbac::{PermManageClients, RequirePermission},
    },
    models::payment::{
        AddPaymentPayload, AttachReceiptPayload, LedgerTotals, Payment, PaymentMutation,
        PaymentReceipt, SetCompletionPayload, UpdatePaymentPayload,
    },
};

// GET /api/clients/{id}/payments
#[utoipa::path(
    get,
    path = "/api/clients/{id}/payments",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 200, description = "Parcelas em ordem de número", body = Vec<Payment>),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .payment_service
        .list_payments(&user, client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(payments)))
}

// POST /api/clients/{id}/payments
#[utoipa::path(
    post,
    path = "/api/clients/{id}/payments",
    tag = "Payments",
    request_body = AddPaymentPayload,
    params(("id" = Uuid, Path, description = "ID do contrato")),
    responses(
        (status = 201, description = "Sinal ou pagamento adicional lançado", body = PaymentMutation),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<AddPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mutation = app_state
        .payment_service
        .add_payment(&user, client_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(mutation)))
}

// POST /api/clients/{id}/payments/{payment_id}/completion
#[utoipa::path(
    post,
    path = "/api/clients/{id}/payments/{payment_id}/completion",
    tag = "Payments",
    request_body = SetCompletionPayload,
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Parcela marcada ou desmarcada", body = PaymentMutation),
        (status = 404, description = "Parcela não encontrada"),
        (status = 409, description = "Versão desatualizada")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_completion(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetCompletionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mutation = app_state
        .payment_service
        .set_completion(&user, client_id, payment_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mutation)))
}

// PUT /api/clients/{id}/payments/{payment_id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}/payments/{payment_id}",
    tag = "Payments",
    request_body = UpdatePaymentPayload,
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Valor ou vencimento ajustado", body = PaymentMutation),
        (status = 404, description = "Parcela não encontrada"),
        (status = 409, description = "Versão desatualizada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdatePaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mutation = app_state
        .payment_service
        .update_payment(&user, client_id, payment_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(mutation)))
}

// DELETE /api/clients/{id}/payments/{payment_id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}/payments/{payment_id}",
    tag = "Payments",
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Lançamento removido; totais recalculados", body = LedgerTotals),
        (status = 400, description = "Parcelas do cronograma não podem ser removidas"),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let totals = app_state
        .payment_service
        .delete_payment(&user, client_id, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(totals)))
}

// =============================================================================
//  COMPROVANTES
// =============================================================================

// POST /api/clients/{id}/payments/{payment_id}/receipts
#[utoipa::path(
    post,
    path = "/api/clients/{id}/payments/{payment_id}/receipts",
    tag = "Payments",
    request_body = AttachReceiptPayload,
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 201, description = "Comprovante anexado", body = PaymentReceipt),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn attach_receipt(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AttachReceiptPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let receipt = app_state
        .payment_service
        .attach_receipt(&user, client_id, payment_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/clients/{id}/payments/{payment_id}/receipts
#[utoipa::path(
    get,
    path = "/api/clients/{id}/payments/{payment_id}/receipts",
    tag = "Payments",
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Comprovantes da parcela", body = Vec<PaymentReceipt>),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_receipts(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let receipts = app_state
        .payment_service
        .list_receipts(&user, client_id, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(receipts)))
}
