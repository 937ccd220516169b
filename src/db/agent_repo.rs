// src/db/agent_repo.rs

use sqlx::{PgPool, QueryBuilder, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::agent::{Agent, AgentInstallmentKind, CreateAgentPayload, UpdateAgentPayload},
};

#[derive(Clone)]
pub struct AgentRepository {
    pool: PgPool,
}

impl AgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: &CreateAgentPayload, employee_id: Uuid) -> Result<Agent, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            INSERT INTO agents (
                full_name, phone, email, notes, employee_id, first_payment_date,
                payment_amount_1, payment_amount_2, payment_amount_3,
                payout_amount_1, payout_amount_2, payout_amount_3
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&payload.full_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(&payload.notes)
        .bind(employee_id)
        .bind(payload.first_payment_date)
        .bind(payload.payment_amount_1)
        .bind(payload.payment_amount_2)
        .bind(payload.payment_amount_3)
        .bind(payload.payout_amount_1)
        .bind(payload.payout_amount_2)
        .bind(payload.payout_amount_3)
        .fetch_one(&self.pool)
        .await?;

        Ok(agent)
    }

    pub async fn list(&self, employee_filter: Option<Uuid>) -> Result<Vec<Agent>, AppError> {
        let agents = sqlx::query_as::<_, Agent>(
            r#"
            SELECT * FROM agents
            WHERE ($1::uuid IS NULL OR employee_id = $1)
            ORDER BY first_payment_date DESC, full_name ASC
            "#,
        )
        .bind(employee_filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(agents)
    }

    pub async fn find_by_id(&self, id: Uuid, employee_filter: Option<Uuid>) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)",
        )
        .bind(id)
        .bind(employee_filter)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateAgentPayload,
        employee_id: Option<Uuid>,
        employee_filter: Option<Uuid>,
    ) -> Result<Option<Agent>, AppError> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            UPDATE agents
            SET full_name = COALESCE($3, full_name),
                phone = CASE WHEN $15 THEN NULL ELSE COALESCE($4, phone) END,
                email = CASE WHEN $16 THEN NULL ELSE COALESCE($5, email) END,
                notes = CASE WHEN $17 THEN NULL ELSE COALESCE($6, notes) END,
                first_payment_date = COALESCE($7, first_payment_date),
                payment_amount_1 = COALESCE($8, payment_amount_1),
                payment_amount_2 = COALESCE($9, payment_amount_2),
                payment_amount_3 = COALESCE($10, payment_amount_3),
                payout_amount_1 = COALESCE($11, payout_amount_1),
                payout_amount_2 = COALESCE($12, payout_amount_2),
                payout_amount_3 = COALESCE($13, payout_amount_3),
                employee_id = COALESCE($14, employee_id),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(employee_filter)
        .bind(&payload.full_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(&payload.notes)
        .bind(payload.first_payment_date)
        .bind(payload.payment_amount_1)
        .bind(payload.payment_amount_2)
        .bind(payload.payment_amount_3)
        .bind(payload.payout_amount_1)
        .bind(payload.payout_amount_2)
        .bind(payload.payout_amount_3)
        .bind(employee_id)
        .bind(payload.clear_phone)
        .bind(payload.clear_email)
        .bind(payload.clear_notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    /// Alterna uma das seis colunas de conclusão.
    pub async fn set_installment(
        &self,
        id: Uuid,
        kind: AgentInstallmentKind,
        index: u8,
        completed: bool,
        employee_filter: Option<Uuid>,
    ) -> Result<Option<Agent>, AppError> {
        // O nome da coluna vem de uma lista fechada, nunca do cliente
        let column = kind.column(index).ok_or(AppError::InvalidAgentInstallment)?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE agents SET ");
        builder
            .push(column)
            .push(" = ")
            .push_bind(completed)
            .push(", updated_at = NOW() WHERE id = ")
            .push_bind(id)
            .push(" AND (")
            .push_bind(employee_filter)
            .push("::uuid IS NULL OR employee_id = ")
            .push_bind(employee_filter)
            .push(") RETURNING *");

        let agent = builder
            .build_query_as::<Agent>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(agent)
    }

    pub async fn delete(&self, id: Uuid, employee_filter: Option<Uuid>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM agents WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)",
        )
        .bind(id)
        .bind(employee_filter)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
