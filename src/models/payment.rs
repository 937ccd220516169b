// src/models/payment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::validation::{non_negative_amount, positive_amount};

// --- ENUMS ---

// Mapeia o CREATE TYPE payment_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    First,      // Entrada (parcela 0)
    Monthly,    // Mensalidade do plano
    Deposit,    // Sinal avulso
    Additional, // Pagamento extra
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::First => "first",
            PaymentType::Monthly => "monthly",
            PaymentType::Deposit => "deposit",
            PaymentType::Additional => "additional",
        }
    }

    /// Entrada e sinal compõem o `deposit_paid` do contrato.
    pub fn is_deposit(&self) -> bool {
        matches!(self, PaymentType::First | PaymentType::Deposit)
    }

    /// Parcelas geradas pelo cronograma (não podem ser removidas individualmente).
    pub fn is_scheduled(&self) -> bool {
        matches!(self, PaymentType::First | PaymentType::Monthly)
    }
}

// --- LINHA DO LIVRO DE PARCELAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub client_id: Uuid,

    #[schema(example = 1)]
    pub payment_number: i32,

    #[schema(example = "10000.00")]
    pub original_amount: Decimal,
    pub custom_amount: Option<Decimal>,

    #[schema(value_type = String, format = Date, example = "2024-02-15")]
    pub due_date: NaiveDate,

    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,

    pub payment_type: PaymentType,

    // Controle de concorrência otimista
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Valor efetivo: o customizado, se houver, senão o original.
    pub fn effective_amount(&self) -> Decimal {
        self.custom_amount.unwrap_or(self.original_amount)
    }
}

/// Linha produzida pelo gerador de cronograma, antes de ser gravada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInstallment {
    pub payment_number: i32,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub payment_type: PaymentType,
}

/// Agregados do contrato recalculados a partir do livro de parcelas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub deposit_paid: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMutation {
    pub payment: Payment,
    pub totals: LedgerTotals,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetCompletionPayload {
    #[schema(example = true)]
    pub completed: bool,
    /// Versão lida pelo cliente; escrita recusada se estiver desatualizada.
    #[schema(example = 1)]
    pub version: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentPayload {
    #[schema(example = 1)]
    pub version: i32,

    #[validate(custom(function = "non_negative_amount"))]
    #[schema(example = "9500.00")]
    pub custom_amount: Option<Decimal>,

    /// Volta a usar o valor original.
    #[serde(default)]
    pub clear_custom_amount: bool,

    #[schema(value_type = Option<String>, format = Date, example = "2024-03-20")]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentPayload {
    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "5000.00")]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-03-01")]
    pub due_date: NaiveDate,

    #[schema(example = "additional")]
    pub payment_type: PaymentType,
}

// --- RECIBOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub id: Uuid,
    pub payment_id: Uuid,
    #[schema(example = "comprovante-marco.pdf")]
    pub file_name: String,
    #[schema(example = "https://storage.example.com/receipts/abc.pdf")]
    pub file_url: String,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachReceiptPayload {
    #[validate(length(min = 1, message = "required"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub file_url: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Linha em aberto, versão 1.
    pub fn payment(
        client_id: Uuid,
        payment_number: i32,
        amount: Decimal,
        due_date: NaiveDate,
        payment_type: PaymentType,
    ) -> Payment {
        let now = Utc::now();
        Payment {
            id: Uuid::new_v4(),
            client_id,
            payment_number,
            original_amount: amount,
            custom_amount: None,
            due_date,
            is_completed: false,
            completed_at: None,
            payment_type,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn completed(mut payment: Payment, at: DateTime<Utc>) -> Payment {
        payment.is_completed = true;
        payment.completed_at = Some(at);
        payment
    }
}
