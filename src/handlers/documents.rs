// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageClients, RequirePermission},
    },
};

// GET /api/clients/{id}/payments/{payment_id}/receipt.pdf
#[utoipa::path(
    get,
    path = "/api/clients/{id}/payments/{payment_id}/receipt.pdf",
    tag = "Payments",
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("payment_id" = Uuid, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Recibo em PDF", content_type = "application/pdf"),
        (status = 400, description = "Parcela ainda não foi paga"),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_receipt_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermManageClients>,
    Path((client_id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .generate_receipt_pdf(&user, client_id, payment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Headers para o navegador baixar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"recibo_{}.pdf\"", payment_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
