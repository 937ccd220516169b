// src/db/client_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, period::MonthWindow},
    models::{
        client::{Client, ContractTerms, HistoryKind},
        payment::LedgerTotals,
    },
};

/// Dados de um novo contrato, já resolvidos pelo serviço.
pub struct NewClient<'a> {
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub contract_amount: Decimal,
    pub terms: ContractTerms,
    pub deposit_target: Decimal,
    pub employee_id: Uuid,
    pub user_id: Uuid,
}

/// Campos editáveis fora do cronograma. `None` mantém o valor atual;
/// as flags `clear_*` gravam NULL no contato correspondente.
#[derive(Default)]
pub struct ClientChanges<'a> {
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub clear_phone: bool,
    pub clear_email: bool,
    pub clear_notes: bool,
    pub contract_amount: Option<Decimal>,
    pub deposit_target: Option<Decimal>,
    pub employee_id: Option<Uuid>,
}

// Repetir a ação atualiza o motivo, mas a data do primeiro evento é mantida:
// é ela que decide em quais meses o contrato ainda conta.
const MARK_TERMINATED_SQL: &str = r#"
    UPDATE clients
    SET is_terminated = TRUE, terminated_at = COALESCE(terminated_at, NOW()),
        termination_reason = $2, updated_at = NOW()
    WHERE id = $1 AND ($3::uuid IS NULL OR employee_id = $3)
    RETURNING *
"#;

const MARK_SUSPENDED_SQL: &str = r#"
    UPDATE clients
    SET is_suspended = TRUE, suspended_at = COALESCE(suspended_at, NOW()),
        suspension_reason = $2, updated_at = NOW()
    WHERE id = $1 AND ($3::uuid IS NULL OR employee_id = $3)
    RETURNING *
"#;

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewClient<'_>) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Agregados começam zerados; o saldo devedor é o valor do contrato
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (
                full_name, phone, email, notes,
                contract_amount, first_payment, monthly_payment,
                installment_period, payment_day, contract_date,
                total_paid, remaining_amount, deposit_paid, deposit_target,
                employee_id, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $5, 0, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(new.full_name)
        .bind(new.phone)
        .bind(new.email)
        .bind(new.notes)
        .bind(new.contract_amount)
        .bind(new.terms.first_payment)
        .bind(new.terms.monthly_payment)
        .bind(new.terms.installment_period)
        .bind(new.terms.payment_day)
        .bind(new.terms.contract_date)
        .bind(new.deposit_target)
        .bind(new.employee_id)
        .bind(new.user_id)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }

    /// Busca respeitando o escopo: fora dele o contrato "não existe".
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        employee_filter: Option<Uuid>,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)",
        )
        .bind(id)
        .bind(employee_filter)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    /// Igual a `find_by_id`, mas trava a linha até o fim da transação.
    /// Serializa as reconciliações concorrentes do mesmo contrato.
    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        employee_filter: Option<Uuid>,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(employee_filter)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    // Carteira ativa: rescindidos e suspensos ficam de fora
    pub async fn list_active(&self, employee_filter: Option<Uuid>) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE NOT is_terminated AND NOT is_suspended
              AND ($1::uuid IS NULL OR employee_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(employee_filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Todos os contratos assinados até `until`, inclusive os inativos (para métricas).
    pub async fn list_signed_until(
        &self,
        until: NaiveDate,
        employee_filter: Option<Uuid>,
    ) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE contract_date <= $1
              AND ($2::uuid IS NULL OR employee_id = $2)
            "#,
        )
        .bind(until)
        .bind(employee_filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    pub async fn list_history(
        &self,
        kind: HistoryKind,
        window: &MonthWindow,
        employee_filter: Option<Uuid>,
    ) -> Result<Vec<Client>, AppError> {
        let sql = match kind {
            HistoryKind::Terminated => {
                r#"
                SELECT * FROM clients
                WHERE is_terminated AND terminated_at >= $1 AND terminated_at < $2
                  AND ($3::uuid IS NULL OR employee_id = $3)
                ORDER BY terminated_at DESC
                "#
            }
            HistoryKind::Suspended => {
                r#"
                SELECT * FROM clients
                WHERE is_suspended AND suspended_at >= $1 AND suspended_at < $2
                  AND ($3::uuid IS NULL OR employee_id = $3)
                ORDER BY suspended_at DESC
                "#
            }
        };

        let clients = sqlx::query_as::<_, Client>(sql)
            .bind(window.start_instant())
            .bind(window.end_instant())
            .bind(employee_filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub async fn update_details<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &ClientChanges<'_>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET full_name = COALESCE($2, full_name),
                phone = CASE WHEN $9 THEN NULL ELSE COALESCE($3, phone) END,
                email = CASE WHEN $10 THEN NULL ELSE COALESCE($4, email) END,
                notes = CASE WHEN $11 THEN NULL ELSE COALESCE($5, notes) END,
                contract_amount = COALESCE($6, contract_amount),
                deposit_target = COALESCE($7, deposit_target),
                employee_id = COALESCE($8, employee_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.phone)
        .bind(changes.email)
        .bind(changes.notes)
        .bind(changes.contract_amount)
        .bind(changes.deposit_target)
        .bind(changes.employee_id)
        .bind(changes.clear_phone)
        .bind(changes.clear_email)
        .bind(changes.clear_notes)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ClientNotFound)?;

        Ok(client)
    }

    /// Substitui as condições do contrato e zera os agregados.
    pub async fn replace_terms<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        contract_amount: Decimal,
        terms: &ContractTerms,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET contract_amount = $2,
                first_payment = $3,
                monthly_payment = $4,
                installment_period = $5,
                payment_day = $6,
                contract_date = $7,
                total_paid = 0,
                deposit_paid = 0,
                remaining_amount = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(contract_amount)
        .bind(terms.first_payment)
        .bind(terms.monthly_payment)
        .bind(terms.installment_period)
        .bind(terms.payment_day)
        .bind(terms.contract_date)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ClientNotFound)?;

        Ok(client)
    }

    pub async fn update_totals<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        totals: &LedgerTotals,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE clients
            SET total_paid = $2, remaining_amount = $3, deposit_paid = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(totals.total_paid)
        .bind(totals.remaining_amount)
        .bind(totals.deposit_paid)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn mark_terminated(
        &self,
        id: Uuid,
        reason: &str,
        employee_filter: Option<Uuid>,
    ) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>(MARK_TERMINATED_SQL)
        .bind(id)
        .bind(reason)
        .bind(employee_filter)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ClientNotFound)
    }

    pub async fn mark_suspended(
        &self,
        id: Uuid,
        reason: &str,
        employee_filter: Option<Uuid>,
    ) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>(MARK_SUSPENDED_SQL)
        .bind(id)
        .bind(reason)
        .bind(employee_filter)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ClientNotFound)
    }

    // Volta para a carteira ativa e limpa os dois estados
    pub async fn reactivate(&self, id: Uuid, employee_filter: Option<Uuid>) -> Result<Client, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET is_terminated = FALSE, terminated_at = NULL, termination_reason = NULL,
                is_suspended = FALSE, suspended_at = NULL, suspension_reason = NULL,
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR employee_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(employee_filter)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ClientNotFound)
    }

    // O livro de parcelas cai junto (ON DELETE CASCADE)
    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
