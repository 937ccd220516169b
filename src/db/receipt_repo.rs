// src/db/receipt_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::payment::PaymentReceipt};

// Metadados dos comprovantes; o arquivo em si fica no armazenamento externo
#[derive(Clone)]
pub struct ReceiptRepository {
    pool: PgPool,
}

impl ReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        payment_id: Uuid,
        file_name: &str,
        file_url: &str,
        uploaded_by: Uuid,
    ) -> Result<PaymentReceipt, AppError> {
        let receipt = sqlx::query_as::<_, PaymentReceipt>(
            r#"
            INSERT INTO payment_receipts (payment_id, file_name, file_url, uploaded_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(file_name)
        .bind(file_url)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(receipt)
    }

    pub async fn list_by_payment(&self, payment_id: Uuid) -> Result<Vec<PaymentReceipt>, AppError> {
        let receipts = sqlx::query_as::<_, PaymentReceipt>(
            "SELECT * FROM payment_receipts WHERE payment_id = $1 ORDER BY created_at DESC",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(receipts)
    }
}
