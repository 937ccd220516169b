// src/db/bonus_repo.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, period::MonthWindow},
    models::{
        auth::Role,
        bonus::{BonusRule, EmployeeBonus},
    },
};

#[derive(Clone)]
pub struct BonusRepository {
    pool: PgPool,
}

impl BonusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  REGRAS
    // =========================================================================

    pub async fn create_rule(
        &self,
        employee_id: Option<Uuid>,
        role: Option<Role>,
        threshold_percent: Decimal,
        bonus_amount: Decimal,
    ) -> Result<BonusRule, AppError> {
        let rule = sqlx::query_as::<_, BonusRule>(
            r#"
            INSERT INTO bonus_rules (employee_id, role, threshold_percent, bonus_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(employee_id)
        .bind(role)
        .bind(threshold_percent)
        .bind(bonus_amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(rule)
    }

    pub async fn list_rules(&self) -> Result<Vec<BonusRule>, AppError> {
        let rules = sqlx::query_as::<_, BonusRule>(
            "SELECT * FROM bonus_rules ORDER BY employee_id NULLS LAST, threshold_percent ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Regras que podem valer para o funcionário: as dele e as do seu papel.
    pub async fn rules_for(&self, employee_id: Uuid, role: Role) -> Result<Vec<BonusRule>, AppError> {
        let rules = sqlx::query_as::<_, BonusRule>(
            "SELECT * FROM bonus_rules WHERE employee_id = $1 OR role = $2",
        )
        .bind(employee_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    pub async fn delete_rule(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM bonus_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  BÔNUS APURADOS
    // =========================================================================

    /// Uma apuração por funcionário e mês; recalcular substitui a anterior.
    pub async fn upsert_bonus(
        &self,
        employee_id: Uuid,
        window: &MonthWindow,
        plan_sum: Decimal,
        collected_sum: Decimal,
        completion_percent: Decimal,
        bonus_amount: Decimal,
    ) -> Result<EmployeeBonus, AppError> {
        let bonus = sqlx::query_as::<_, EmployeeBonus>(
            r#"
            INSERT INTO employee_bonuses
                (employee_id, year, month, plan_sum, collected_sum, completion_percent, bonus_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (employee_id, year, month) DO UPDATE
            SET plan_sum = EXCLUDED.plan_sum,
                collected_sum = EXCLUDED.collected_sum,
                completion_percent = EXCLUDED.completion_percent,
                bonus_amount = EXCLUDED.bonus_amount,
                created_at = NOW()
            RETURNING *
            "#,
        )
        .bind(employee_id)
        .bind(window.year)
        .bind(window.month as i32)
        .bind(plan_sum)
        .bind(collected_sum)
        .bind(completion_percent)
        .bind(bonus_amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(bonus)
    }

    pub async fn list_bonuses(
        &self,
        employee_filter: Option<Uuid>,
        year: Option<i32>,
        month: Option<i32>,
    ) -> Result<Vec<EmployeeBonus>, AppError> {
        let bonuses = sqlx::query_as::<_, EmployeeBonus>(
            r#"
            SELECT * FROM employee_bonuses
            WHERE ($1::uuid IS NULL OR employee_id = $1)
              AND ($2::int IS NULL OR year = $2)
              AND ($3::int IS NULL OR month = $3)
            ORDER BY year DESC, month DESC
            "#,
        )
        .bind(employee_filter)
        .bind(year)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;

        Ok(bonuses)
    }
}
