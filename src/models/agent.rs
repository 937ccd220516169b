// src/models/agent.rs

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::period::add_months_on_day,
    models::validation::{non_negative_amount, set_or_clear},
};

// Dia fixo do mês em que os repasses ao agente são pagos
const PAYOUT_DAY: u32 = 3;

/// Parceiro de indicação. Independente dos contratos de clientes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,

    #[schema(example = "Marcos Indicações")]
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,

    pub employee_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2024-02-10")]
    pub first_payment_date: NaiveDate,

    // Três parcelas pagas pelo cliente indicado
    pub payment_amount_1: Decimal,
    pub payment_amount_2: Decimal,
    pub payment_amount_3: Decimal,
    pub payment_month_1: bool,
    pub payment_month_2: bool,
    pub payment_month_3: bool,

    // Três repasses de comissão ao agente
    pub payout_amount_1: Decimal,
    pub payout_amount_2: Decimal,
    pub payout_amount_3: Decimal,
    pub payout_1: bool,
    pub payout_2: bool,
    pub payout_3: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AgentInstallmentKind {
    Payment,
    Payout,
}

impl AgentInstallmentKind {
    /// Nome da coluna de conclusão para o índice (1..=3).
    pub fn column(&self, index: u8) -> Option<&'static str> {
        match (self, index) {
            (AgentInstallmentKind::Payment, 1) => Some("payment_month_1"),
            (AgentInstallmentKind::Payment, 2) => Some("payment_month_2"),
            (AgentInstallmentKind::Payment, 3) => Some("payment_month_3"),
            (AgentInstallmentKind::Payout, 1) => Some("payout_1"),
            (AgentInstallmentKind::Payout, 2) => Some("payout_2"),
            (AgentInstallmentKind::Payout, 3) => Some("payout_3"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentInstallment {
    pub kind: AgentInstallmentKind,
    pub index: u8,
    pub amount: Decimal,
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    pub completed: bool,
}

impl Agent {
    /// Vencimento da parcela `index` do cliente indicado: data da primeira + (index − 1) meses.
    pub fn payment_due(&self, index: u8) -> Option<NaiveDate> {
        let offset = u32::from(index.checked_sub(1)?);
        self.first_payment_date.checked_add_months(Months::new(offset))
    }

    /// Repasse `index`: dia 3 do mês seguinte ao vencimento da parcela correspondente.
    pub fn payout_due(&self, index: u8) -> Option<NaiveDate> {
        add_months_on_day(self.payment_due(index)?, 1, PAYOUT_DAY)
    }

    /// Calendário completo (3 parcelas + 3 repasses) em ordem de vencimento.
    pub fn schedule(&self) -> Vec<AgentInstallment> {
        let payments = [
            (self.payment_amount_1, self.payment_month_1),
            (self.payment_amount_2, self.payment_month_2),
            (self.payment_amount_3, self.payment_month_3),
        ];
        let payouts = [
            (self.payout_amount_1, self.payout_1),
            (self.payout_amount_2, self.payout_2),
            (self.payout_amount_3, self.payout_3),
        ];

        let mut schedule = Vec::with_capacity(6);
        for (i, ((pay_amount, pay_done), (out_amount, out_done))) in
            payments.into_iter().zip(payouts).enumerate()
        {
            let index = (i + 1) as u8;
            if let Some(due_date) = self.payment_due(index) {
                schedule.push(AgentInstallment {
                    kind: AgentInstallmentKind::Payment,
                    index,
                    amount: pay_amount,
                    due_date,
                    completed: pay_done,
                });
            }
            if let Some(due_date) = self.payout_due(index) {
                schedule.push(AgentInstallment {
                    kind: AgentInstallmentKind::Payout,
                    index,
                    amount: out_amount,
                    due_date,
                    completed: out_done,
                });
            }
        }
        schedule.sort_by_key(|i| i.due_date);
        schedule
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub schedule: Vec<AgentInstallment>,
    pub received_total: Decimal,
    pub paid_out_total: Decimal,
}

impl From<Agent> for AgentView {
    fn from(agent: Agent) -> Self {
        let schedule = agent.schedule();
        let total = |kind: AgentInstallmentKind| {
            schedule
                .iter()
                .filter(|i| i.kind == kind && i.completed)
                .map(|i| i.amount)
                .sum::<Decimal>()
        };
        let received_total = total(AgentInstallmentKind::Payment);
        let paid_out_total = total(AgentInstallmentKind::Payout);

        Self {
            agent,
            schedule,
            received_total,
            paid_out_total,
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub notes: Option<String>,

    #[schema(value_type = String, format = Date, example = "2024-02-10")]
    pub first_payment_date: NaiveDate,

    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payment_amount_1: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payment_amount_2: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payment_amount_3: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payout_amount_1: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payout_amount_2: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[serde(default)]
    pub payout_amount_3: Decimal,

    /// Só administradores escolhem o responsável.
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_agent_clears"))]
pub struct UpdateAgentPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub clear_phone: bool,
    #[serde(default)]
    pub clear_email: bool,
    #[serde(default)]
    pub clear_notes: bool,
    #[schema(value_type = Option<String>, format = Date)]
    pub first_payment_date: Option<NaiveDate>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payment_amount_1: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payment_amount_2: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payment_amount_3: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payout_amount_1: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payout_amount_2: Option<Decimal>,
    #[validate(custom(function = "non_negative_amount"))]
    pub payout_amount_3: Option<Decimal>,
    pub employee_id: Option<Uuid>,
}

fn validate_agent_clears(payload: &UpdateAgentPayload) -> Result<(), ValidationError> {
    set_or_clear(&[
        (payload.phone.is_some(), payload.clear_phone),
        (payload.email.is_some(), payload.clear_email),
        (payload.notes.is_some(), payload.clear_notes),
    ])
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAgentInstallmentPayload {
    pub kind: AgentInstallmentKind,
    #[schema(example = 1)]
    pub index: u8,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn agent(first_payment_date: NaiveDate) -> Agent {
        let now = Utc::now();
        Agent {
            id: Uuid::new_v4(),
            full_name: "Agente".into(),
            phone: None,
            email: None,
            notes: None,
            employee_id: Uuid::new_v4(),
            first_payment_date,
            payment_amount_1: Decimal::from(3000),
            payment_amount_2: Decimal::from(3000),
            payment_amount_3: Decimal::from(3000),
            payment_month_1: true,
            payment_month_2: false,
            payment_month_3: false,
            payout_amount_1: Decimal::from(1000),
            payout_amount_2: Decimal::from(1000),
            payout_amount_3: Decimal::from(1000),
            payout_1: true,
            payout_2: false,
            payout_3: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn payments_are_monthly_from_first_date() {
        let a = agent(d(2024, 1, 31));
        assert_eq!(a.payment_due(1), Some(d(2024, 1, 31)));
        assert_eq!(a.payment_due(2), Some(d(2024, 2, 29)));
        assert_eq!(a.payment_due(3), Some(d(2024, 3, 31)));
        assert_eq!(a.payment_due(0), None);
    }

    #[test]
    fn payouts_snap_to_third_of_following_month() {
        let a = agent(d(2024, 11, 20));
        assert_eq!(a.payout_due(1), Some(d(2024, 12, 3)));
        assert_eq!(a.payout_due(2), Some(d(2025, 1, 3)));
        assert_eq!(a.payout_due(3), Some(d(2025, 2, 3)));
    }

    #[test]
    fn view_sums_completed_installments_only() {
        let view = AgentView::from(agent(d(2024, 2, 10)));
        assert_eq!(view.schedule.len(), 6);
        assert_eq!(view.received_total, Decimal::from(3000));
        assert_eq!(view.paid_out_total, Decimal::from(1000));
        assert!(view.schedule.windows(2).all(|w| w[0].due_date <= w[1].due_date));
    }

    #[test]
    fn installment_columns_are_bounded() {
        assert_eq!(AgentInstallmentKind::Payout.column(2), Some("payout_2"));
        assert_eq!(AgentInstallmentKind::Payment.column(4), None);
        assert_eq!(AgentInstallmentKind::Payment.column(0), None);
    }

    #[test]
    fn update_rejects_clearing_a_field_it_also_sets() {
        let wipe: UpdateAgentPayload =
            serde_json::from_value(serde_json::json!({ "clearPhone": true })).unwrap();
        assert!(wipe.clear_phone);
        assert!(wipe.validate().is_ok());

        let both: UpdateAgentPayload = serde_json::from_value(serde_json::json!({
            "notes": "ligar à tarde",
            "clearNotes": true
        }))
        .unwrap();
        assert!(both.validate().is_err());
    }
}
