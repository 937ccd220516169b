// src/models/bonus.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    auth::Role,
    validation::{non_negative_amount, percent_range},
};

/// Faixa de bônus: atingido `threshold_percent` do plano do mês, paga `bonus_amount`.
/// A regra vale para um funcionário específico OU para todos de um papel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BonusRule {
    pub id: Uuid,
    pub employee_id: Option<Uuid>,
    pub role: Option<Role>,
    #[schema(example = "80.00")]
    pub threshold_percent: Decimal,
    #[schema(example = "1500.00")]
    pub bonus_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBonus {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub plan_sum: Decimal,
    pub collected_sum: Decimal,
    pub completion_percent: Decimal,
    pub bonus_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_rule_target"))]
pub struct CreateBonusRulePayload {
    pub employee_id: Option<Uuid>,
    pub role: Option<Role>,
    #[validate(custom(function = "percent_range"))]
    #[schema(example = "100.00")]
    pub threshold_percent: Decimal,
    #[validate(custom(function = "non_negative_amount"))]
    #[schema(example = "2000.00")]
    pub bonus_amount: Decimal,
}

fn validate_rule_target(payload: &CreateBonusRulePayload) -> Result<(), ValidationError> {
    if payload.employee_id.is_some() == payload.role.is_some() {
        let mut err = ValidationError::new("rule_target");
        err.message = Some("required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BonusQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub employee_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(employee_id: Option<Uuid>, role: Option<Role>) -> CreateBonusRulePayload {
        CreateBonusRulePayload {
            employee_id,
            role,
            threshold_percent: dec!(100),
            bonus_amount: dec!(2000),
        }
    }

    #[test]
    fn rule_needs_exactly_one_target() {
        assert!(payload(None, None).validate().is_err());
        assert!(payload(Some(Uuid::new_v4()), Some(Role::Employee)).validate().is_err());
        assert!(payload(Some(Uuid::new_v4()), None).validate().is_ok());
        assert!(payload(None, Some(Role::Employee)).validate().is_ok());
    }

    #[test]
    fn threshold_must_be_in_range() {
        let mut p = payload(None, Some(Role::Employee));
        p.threshold_percent = dec!(-5);
        assert!(p.validate().is_err());
    }
}
