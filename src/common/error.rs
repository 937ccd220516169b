// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale, models::auth::Permission};

// Erro interno da aplicação. Os serviços e repositórios só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão negada: {}", .0.slug())]
    PermissionDenied(Permission),

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Parcela não encontrada")]
    PaymentNotFound,

    #[error("Agente não encontrado")]
    AgentNotFound,

    #[error("Regra de bônus não encontrada")]
    BonusRuleNotFound,

    #[error("Condições de contrato inválidas: {0}")]
    InvalidContractTerms(String),

    #[error("Campos do cronograma só mudam via redefinição")]
    ScheduleChangeRequiresReset,

    #[error("Redefinição de cronograma não confirmada")]
    ResetNotConfirmed,

    #[error("Versão da parcela desatualizada")]
    StalePaymentVersion,

    #[error("Parcela não quitada")]
    PaymentNotCompleted,

    #[error("Parcela não pode ser removida")]
    PaymentNotRemovable,

    #[error("Parcela de agente inválida")]
    InvalidAgentInstallment,

    #[error("Usuário tentou remover a própria conta")]
    CannotDeleteSelf,

    #[error("Usuário ainda responde por clientes ou agentes")]
    UserInUse,

    #[error("Período inválido")]
    InvalidPeriod,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Erro "de fio": o que o cliente HTTP efetivamente recebe.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidContractTerms(_)
            | AppError::ResetNotConfirmed
            | AppError::InvalidAgentInstallment
            | AppError::InvalidPeriod => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::ClientNotFound
            | AppError::PaymentNotFound
            | AppError::AgentNotFound
            | AppError::BonusRuleNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::ScheduleChangeRequiresReset
            | AppError::StalePaymentVersion
            | AppError::PaymentNotCompleted
            | AppError::PaymentNotRemovable
            | AppError::CannotDeleteSelf
            | AppError::UserInUse => StatusCode::CONFLICT,

            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave da mensagem no catálogo de traduções.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::UserNotFound => "user_not_found",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::ClientNotFound => "client_not_found",
            AppError::PaymentNotFound => "payment_not_found",
            AppError::AgentNotFound => "agent_not_found",
            AppError::BonusRuleNotFound => "bonus_rule_not_found",
            AppError::InvalidContractTerms(_) => "invalid_contract_terms",
            AppError::ScheduleChangeRequiresReset => "schedule_change_requires_reset",
            AppError::ResetNotConfirmed => "reset_not_confirmed",
            AppError::StalePaymentVersion => "stale_payment_version",
            AppError::PaymentNotCompleted => "payment_not_completed",
            AppError::PaymentNotRemovable => "payment_not_removable",
            AppError::InvalidAgentInstallment => "invalid_agent_installment",
            AppError::CannotDeleteSelf => "cannot_delete_self",
            AppError::UserInUse => "user_in_use",
            AppError::InvalidPeriod => "invalid_period",
            _ => "internal_error",
        }
    }

    /// Converte o erro interno na resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(&*e.code);
                            store.translate(&locale.0, &format!("validation.{}", code), &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status,
                    error: store.translate(&locale.0, self.message_key(), &[]),
                    details: Some(json!(details)),
                }
            }
            AppError::PermissionDenied(permission) => ApiError {
                status,
                error: store.translate(
                    &locale.0,
                    self.message_key(),
                    &[("permission", permission.slug())],
                ),
                details: None,
            },
            AppError::InvalidContractTerms(reason) => ApiError {
                status,
                error: store.translate(&locale.0, self.message_key(), &[("reason", reason.as_str())]),
                details: Some(json!({ "reason": reason })),
            },
            _ => ApiError {
                status,
                error: store.translate(&locale.0, self.message_key(), &[]),
                details: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let api = AppError::StalePaymentVersion.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("changed by someone else"));
    }

    #[test]
    fn permission_denied_names_the_permission() {
        let err = AppError::PermissionDenied(Permission::ManageUsers);
        let api = err.to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.error.contains("users:manage"));
    }

    #[test]
    fn database_errors_hide_details() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
    }

    #[test]
    fn validation_errors_carry_translated_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("range");
        e.message = Some("payment_day_range".into());
        errors.add("paymentDay", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(
            details["paymentDay"][0],
            "O dia de pagamento deve estar entre 1 e 31."
        );
    }
}
