// src/db/payment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::payment::{Payment, PaymentType, ScheduledInstallment},
};

// O livro de parcelas ('payments'). Toda escrita aqui acontece dentro da
// transação aberta pelo serviço, junto com a atualização dos agregados.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grava o cronograma inteiro em um único INSERT.
    pub async fn insert_schedule<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        rows: &[ScheduledInstallment],
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let numbers: Vec<i32> = rows.iter().map(|r| r.payment_number).collect();
        let amounts: Vec<Decimal> = rows.iter().map(|r| r.amount).collect();
        let due_dates: Vec<NaiveDate> = rows.iter().map(|r| r.due_date).collect();
        // Enum customizado vai como texto e é convertido no SQL
        let kinds: Vec<&str> = rows.iter().map(|r| r.payment_type.as_str()).collect();

        let mut payments = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (client_id, payment_number, original_amount, due_date, payment_type)
            SELECT $1, t.n, t.amount, t.due, t.kind::payment_type
            FROM UNNEST($2::int4[], $3::numeric[], $4::date[], $5::text[]) AS t(n, amount, due, kind)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(numbers)
        .bind(amounts)
        .bind(due_dates)
        .bind(kinds)
        .fetch_all(executor)
        .await?;

        payments.sort_by_key(|p| p.payment_number);
        Ok(payments)
    }

    pub async fn list_by_client<'e, E>(&self, executor: E, client_id: Uuid) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE client_id = $1 ORDER BY payment_number ASC",
        )
        .bind(client_id)
        .fetch_all(executor)
        .await?;

        Ok(payments)
    }

    // Usado pelas listagens e pelo dashboard para evitar N+1
    pub async fn list_by_clients(&self, client_ids: &[Uuid]) -> Result<Vec<Payment>, AppError> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE client_id = ANY($1) ORDER BY client_id, payment_number",
        )
        .bind(client_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 AND client_id = $2",
        )
        .bind(payment_id)
        .bind(client_id)
        .fetch_optional(executor)
        .await?;

        Ok(payment)
    }

    /// Marca ou reabre a parcela. `None` ⇒ versão desatualizada ou linha inexistente.
    pub async fn set_completion<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        payment_id: Uuid,
        completed: bool,
        expected_version: i32,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET is_completed = $3,
                completed_at = CASE WHEN $3 THEN COALESCE(completed_at, NOW()) ELSE NULL END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND client_id = $2 AND version = $4
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(client_id)
        .bind(completed)
        .bind(expected_version)
        .fetch_optional(executor)
        .await?;

        Ok(payment)
    }

    /// Edita valor customizado e/ou vencimento, condicionado à versão.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_terms<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        payment_id: Uuid,
        expected_version: i32,
        custom_amount: Option<Decimal>,
        clear_custom_amount: bool,
        due_date: Option<NaiveDate>,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET custom_amount = CASE WHEN $4 THEN NULL ELSE COALESCE($5, custom_amount) END,
                due_date = COALESCE($6, due_date),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND client_id = $2 AND version = $3
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(client_id)
        .bind(expected_version)
        .bind(clear_custom_amount)
        .bind(custom_amount)
        .bind(due_date)
        .fetch_optional(executor)
        .await?;

        Ok(payment)
    }

    pub async fn next_number<'e, E>(&self, executor: E, client_id: Uuid) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let next: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(payment_number), -1) + 1 FROM payments WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(executor)
        .await?;

        Ok(next)
    }

    pub async fn insert_single<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        payment_number: i32,
        amount: Decimal,
        due_date: NaiveDate,
        payment_type: PaymentType,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (client_id, payment_number, original_amount, due_date, payment_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(payment_number)
        .bind(amount)
        .bind(due_date)
        .bind(payment_type)
        .fetch_one(executor)
        .await?;

        Ok(payment)
    }

    pub async fn delete<'e, E>(&self, executor: E, client_id: Uuid, payment_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND client_id = $2")
            .bind(payment_id)
            .bind(client_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_client<'e, E>(&self, executor: E, client_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM payments WHERE client_id = $1")
            .bind(client_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
