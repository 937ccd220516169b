// src/models/client.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::period::MonthWindow,
    models::{
        payment::Payment,
        validation::{non_negative_amount, positive_amount, set_or_clear},
    },
    services::schedule::MAX_INSTALLMENT_PERIOD,
};

// --- CONTRATO (CLIENTE) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,

    #[schema(example = "João Pereira")]
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,

    // Condições financeiras
    #[schema(example = "120000.00")]
    pub contract_amount: Decimal,
    #[schema(example = "20000.00")]
    pub first_payment: Decimal,
    #[schema(example = "10000.00")]
    pub monthly_payment: Decimal,
    #[schema(example = 10)]
    pub installment_period: i32,
    #[schema(example = 15)]
    pub payment_day: i32,
    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub contract_date: NaiveDate,

    // Agregados (derivados do livro de parcelas, mas persistidos)
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub deposit_paid: Decimal,
    pub deposit_target: Decimal,

    // Ciclo de vida
    pub is_terminated: bool,
    pub terminated_at: Option<DateTime<Utc>>,
    pub termination_reason: Option<String>,
    pub is_suspended: bool,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,

    // Responsável e criador
    pub employee_id: Uuid,
    pub user_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn terms(&self) -> ContractTerms {
        ContractTerms {
            contract_date: self.contract_date,
            first_payment: self.first_payment,
            monthly_payment: self.monthly_payment,
            installment_period: self.installment_period,
            payment_day: self.payment_day,
        }
    }

    /// O contrato fazia parte da carteira durante o mês?
    /// Rescindidos/suspensos contam se a data do evento é posterior ao mês analisado.
    pub fn was_active_during(&self, window: &MonthWindow) -> bool {
        if self.contract_date > window.last_day() {
            return false;
        }

        let still_running = |flag: bool, at: Option<DateTime<Utc>>| match (flag, at) {
            (false, _) => true,
            (true, Some(at)) => window.ends_before(at),
            (true, None) => false,
        };

        still_running(self.is_terminated, self.terminated_at)
            && still_running(self.is_suspended, self.suspended_at)
    }
}

/// Campos que definem o cronograma de parcelas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractTerms {
    pub contract_date: NaiveDate,
    pub first_payment: Decimal,
    pub monthly_payment: Decimal,
    pub installment_period: i32,
    pub payment_day: i32,
}

impl ContractTerms {
    /// Soma esperada do cronograma (entrada + mensalidades).
    pub fn scheduled_total(&self) -> Decimal {
        self.first_payment + self.monthly_payment * Decimal::from(self.installment_period.max(0))
    }
}

// --- STATUS (derivado, nunca persistido) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Overdue,
    Completed,
    AlmostDone,
    InProgress,
    NotStarted,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub status: ClientStatus,
    #[schema(example = "41.67")]
    pub completion_percent: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub next_due_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client: Client,
    pub payments: Vec<Payment>,
    pub status: ClientStatus,
    pub completion_percent: Decimal,
    /// Quanto falta pagar em relação ao esperado pelos meses decorridos (só informativo).
    pub arrears_estimate: Decimal,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João Pereira")]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub notes: Option<String>,

    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "120000.00")]
    pub contract_amount: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[schema(example = "20000.00")]
    pub first_payment: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[schema(example = "10000.00")]
    pub monthly_payment: Decimal,
    #[validate(range(min = 1, max = MAX_INSTALLMENT_PERIOD, message = "installment_period_range"))]
    #[schema(example = 10)]
    pub installment_period: i32,
    #[validate(range(min = 1, max = 31, message = "payment_day_range"))]
    #[schema(example = 15)]
    pub payment_day: i32,
    #[schema(value_type = String, format = Date, example = "2024-01-15")]
    pub contract_date: NaiveDate,

    /// Meta de sinal. Ausente ⇒ valor da entrada.
    #[validate(custom(function = "non_negative_amount"))]
    pub deposit_target: Option<Decimal>,

    /// Só administradores escolhem o responsável; funcionários ficam com o próprio contrato.
    pub employee_id: Option<Uuid>,
}

impl CreateClientPayload {
    pub fn terms(&self) -> ContractTerms {
        ContractTerms {
            contract_date: self.contract_date,
            first_payment: self.first_payment,
            monthly_payment: self.monthly_payment,
            installment_period: self.installment_period,
            payment_day: self.payment_day,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_client_clears"))]
pub struct UpdateClientPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub notes: Option<String>,

    /// Campos ausentes ficam como estão; para apagar um contato use a flag.
    #[serde(default)]
    pub clear_phone: bool,
    #[serde(default)]
    pub clear_email: bool,
    #[serde(default)]
    pub clear_notes: bool,

    #[validate(custom(function = "positive_amount"))]
    pub contract_amount: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub deposit_target: Option<Decimal>,
    pub employee_id: Option<Uuid>,

    // Campos do cronograma: só são aceitos se iguais aos atuais.
    #[schema(value_type = Option<String>, format = Date)]
    pub contract_date: Option<NaiveDate>,
    pub first_payment: Option<Decimal>,
    pub monthly_payment: Option<Decimal>,
    pub installment_period: Option<i32>,
    pub payment_day: Option<i32>,
}

impl UpdateClientPayload {
    /// Algum campo do cronograma difere do contrato atual?
    pub fn changes_schedule(&self, current: &ContractTerms) -> bool {
        fn differs<T: PartialEq>(requested: Option<T>, current: T) -> bool {
            requested.is_some_and(|v| v != current)
        }

        differs(self.contract_date, current.contract_date)
            || differs(self.first_payment, current.first_payment)
            || differs(self.monthly_payment, current.monthly_payment)
            || differs(self.installment_period, current.installment_period)
            || differs(self.payment_day, current.payment_day)
    }
}

fn validate_client_clears(payload: &UpdateClientPayload) -> Result<(), ValidationError> {
    set_or_clear(&[
        (payload.phone.is_some(), payload.clear_phone),
        (payload.email.is_some(), payload.clear_email),
        (payload.notes.is_some(), payload.clear_notes),
    ])
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetSchedulePayload {
    /// Precisa ser `true`: a redefinição apaga o histórico de pagamentos.
    #[serde(default)]
    pub confirm: bool,

    #[validate(custom(function = "positive_amount"))]
    pub contract_amount: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub first_payment: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    pub monthly_payment: Decimal,
    #[validate(range(min = 1, max = MAX_INSTALLMENT_PERIOD, message = "installment_period_range"))]
    pub installment_period: i32,
    #[validate(range(min = 1, max = 31, message = "payment_day_range"))]
    pub payment_day: i32,
    #[schema(value_type = String, format = Date, example = "2024-05-10")]
    pub contract_date: NaiveDate,
}

impl ResetSchedulePayload {
    pub fn terms(&self) -> ContractTerms {
        ContractTerms {
            contract_date: self.contract_date,
            first_payment: self.first_payment,
            monthly_payment: self.monthly_payment,
            installment_period: self.installment_period,
            payment_day: self.payment_day,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Cliente desistiu do processo")]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientListQuery {
    pub status: Option<ClientStatus>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Terminated,
    Suspended,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub kind: HistoryKind,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Contrato de referência: 120 000 = 20 000 + 10 × 10 000, assinado em 15/01/2024.
    pub fn client(contract_date: NaiveDate) -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            full_name: "Cliente Teste".into(),
            phone: None,
            email: None,
            notes: None,
            contract_amount: Decimal::from(120_000),
            first_payment: Decimal::from(20_000),
            monthly_payment: Decimal::from(10_000),
            installment_period: 10,
            payment_day: 15,
            contract_date,
            total_paid: Decimal::ZERO,
            remaining_amount: Decimal::from(120_000),
            deposit_paid: Decimal::ZERO,
            deposit_target: Decimal::from(20_000),
            is_terminated: false,
            terminated_at: None,
            termination_reason: None,
            is_suspended: false,
            suspended_at: None,
            suspension_reason: None,
            employee_id: Uuid::new_v4(),
            user_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn terminated_after_month_still_counts_for_that_month() {
        let mut c = fixtures::client(d(2024, 1, 15));
        c.is_terminated = true;
        c.terminated_at = Some(Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap());

        assert!(c.was_active_during(&MonthWindow::new(2024, 3).unwrap()));
        assert!(!c.was_active_during(&MonthWindow::new(2024, 4).unwrap()));
        assert!(!c.was_active_during(&MonthWindow::new(2024, 5).unwrap()));
    }

    #[test]
    fn suspension_follows_the_same_rule() {
        let mut c = fixtures::client(d(2024, 1, 15));
        c.is_suspended = true;
        c.suspended_at = Some(Utc.with_ymd_and_hms(2024, 2, 29, 23, 0, 0).unwrap());

        assert!(c.was_active_during(&MonthWindow::new(2024, 1).unwrap()));
        assert!(!c.was_active_during(&MonthWindow::new(2024, 2).unwrap()));
    }

    #[test]
    fn contract_signed_after_month_is_not_active() {
        let c = fixtures::client(d(2024, 3, 10));
        assert!(!c.was_active_during(&MonthWindow::new(2024, 2).unwrap()));
        assert!(c.was_active_during(&MonthWindow::new(2024, 3).unwrap()));
    }

    #[test]
    fn update_detects_schedule_changes_only_when_values_differ() {
        let c = fixtures::client(d(2024, 1, 15));
        let same = UpdateClientPayload {
            full_name: Some("Outro Nome".into()),
            phone: None,
            email: None,
            notes: None,
            clear_phone: false,
            clear_email: false,
            clear_notes: false,
            contract_amount: None,
            deposit_target: None,
            employee_id: None,
            contract_date: Some(c.contract_date),
            first_payment: None,
            monthly_payment: Some(c.monthly_payment),
            installment_period: None,
            payment_day: None,
        };
        assert!(!same.changes_schedule(&c.terms()));

        let moved = UpdateClientPayload {
            payment_day: Some(20),
            ..same
        };
        assert!(moved.changes_schedule(&c.terms()));
    }

    #[test]
    fn scheduled_total_matches_reference_contract() {
        let c = fixtures::client(d(2024, 1, 15));
        assert_eq!(c.terms().scheduled_total(), c.contract_amount);
    }

    #[test]
    fn clear_flags_default_to_false_and_conflict_with_values() {
        let keep: UpdateClientPayload = serde_json::from_value(serde_json::json!({
            "phone": "11 99999-0000"
        }))
        .unwrap();
        assert!(!keep.clear_phone && !keep.clear_email && !keep.clear_notes);
        assert!(keep.validate().is_ok());

        let wipe: UpdateClientPayload =
            serde_json::from_value(serde_json::json!({ "clearEmail": true, "clearNotes": true }))
                .unwrap();
        assert!(wipe.validate().is_ok());

        let both: UpdateClientPayload = serde_json::from_value(serde_json::json!({
            "email": "novo@exemplo.com",
            "clearEmail": true
        }))
        .unwrap();
        assert!(both.validate().is_err());
    }

    #[test]
    fn installment_period_is_bounded_on_create_and_reset() {
        let body = |period: i32| {
            serde_json::json!({
                "fullName": "Cliente",
                "contractAmount": 120000,
                "firstPayment": 20000,
                "monthlyPayment": 10000,
                "installmentPeriod": period,
                "paymentDay": 15,
                "contractDate": "2024-01-15",
                "confirm": true
            })
        };

        for period in [MAX_INSTALLMENT_PERIOD + 1, i32::MAX] {
            let create: CreateClientPayload = serde_json::from_value(body(period)).unwrap();
            assert!(create.validate().is_err());
            let reset: ResetSchedulePayload = serde_json::from_value(body(period)).unwrap();
            assert!(reset.validate().is_err());
        }

        let create: CreateClientPayload =
            serde_json::from_value(body(MAX_INSTALLMENT_PERIOD)).unwrap();
        assert!(create.validate().is_ok());
    }
}
