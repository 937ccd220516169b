// src/services/payment_service.rs
//
// Operações sobre o livro de parcelas. Cada mutação roda em uma transação
// que trava o contrato, altera a linha e regrava os agregados.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ClientRepository, PaymentRepository, ReceiptRepository},
    models::{
        auth::{AccessScope, User},
        client::Client,
        payment::{
            AddPaymentPayload, AttachReceiptPayload, LedgerTotals, Payment, PaymentMutation,
            PaymentReceipt, PaymentType, SetCompletionPayload, UpdatePaymentPayload,
        },
    },
    services::ledger::reconcile,
};

#[derive(Clone)]
pub struct PaymentService {
    clients: ClientRepository,
    payments: PaymentRepository,
    receipts: ReceiptRepository,
    pool: PgPool,
}

impl PaymentService {
    pub fn new(
        clients: ClientRepository,
        payments: PaymentRepository,
        receipts: ReceiptRepository,
        pool: PgPool,
    ) -> Self {
        Self { clients, payments, receipts, pool }
    }

    /// Abre a transação já com o contrato travado e visível para o usuário.
    async fn begin_for_client(
        &self,
        user: &User,
        client_id: Uuid,
    ) -> Result<(Transaction<'static, Postgres>, Client), AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let mut tx = self.pool.begin().await?;
        let client = self
            .clients
            .lock_by_id(&mut *tx, client_id, filter)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        Ok((tx, client))
    }

    /// Recalcula e grava os agregados dentro da transação corrente.
    async fn reconcile_in(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        client: &Client,
    ) -> Result<LedgerTotals, AppError> {
        let ledger = self.payments.list_by_client(&mut **tx, client.id).await?;
        let totals = reconcile(client.contract_amount, &ledger);
        self.clients.update_totals(&mut **tx, client.id, &totals).await?;
        Ok(totals)
    }

    /// UPDATE condicionado não retornou nada: linha sumiu ou versão velha?
    async fn stale_or_missing(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> AppError {
        match self.payments.find_by_id(&mut **tx, client_id, payment_id).await {
            Ok(Some(_)) => AppError::StalePaymentVersion,
            Ok(None) => AppError::PaymentNotFound,
            Err(e) => e,
        }
    }

    pub async fn list_payments(&self, user: &User, client_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let client = self
            .clients
            .find_by_id(&self.pool, client_id, filter)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        self.payments.list_by_client(&self.pool, client.id).await
    }

    pub async fn set_completion(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
        payload: &SetCompletionPayload,
    ) -> Result<PaymentMutation, AppError> {
        let (mut tx, client) = self.begin_for_client(user, client_id).await?;

        let payment = match self
            .payments
            .set_completion(&mut *tx, client_id, payment_id, payload.completed, payload.version)
            .await?
        {
            Some(p) => p,
            None => return Err(self.stale_or_missing(&mut tx, client_id, payment_id).await),
        };

        let totals = self.reconcile_in(&mut tx, &client).await?;
        tx.commit().await?;

        tracing::info!(
            "Parcela {} do contrato {} {} por {}",
            payment.payment_number,
            client_id,
            if payload.completed { "quitada" } else { "reaberta" },
            user.email
        );
        Ok(PaymentMutation { payment, totals })
    }

    pub async fn update_payment(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
        payload: &UpdatePaymentPayload,
    ) -> Result<PaymentMutation, AppError> {
        let (mut tx, client) = self.begin_for_client(user, client_id).await?;

        let payment = match self
            .payments
            .update_terms(
                &mut *tx,
                client_id,
                payment_id,
                payload.version,
                payload.custom_amount,
                payload.clear_custom_amount,
                payload.due_date,
            )
            .await?
        {
            Some(p) => p,
            None => return Err(self.stale_or_missing(&mut tx, client_id, payment_id).await),
        };

        let totals = self.reconcile_in(&mut tx, &client).await?;
        tx.commit().await?;

        Ok(PaymentMutation { payment, totals })
    }

    /// Linha avulsa (sinal ou pagamento extra) no fim do livro.
    pub async fn add_payment(
        &self,
        user: &User,
        client_id: Uuid,
        payload: &AddPaymentPayload,
    ) -> Result<PaymentMutation, AppError> {
        if payload.payment_type.is_scheduled() {
            return Err(AppError::InvalidContractTerms(format!(
                "{} rows are generated by the schedule",
                payload.payment_type.as_str()
            )));
        }

        let (mut tx, client) = self.begin_for_client(user, client_id).await?;
        let number = self.payments.next_number(&mut *tx, client_id).await?;
        let payment = self
            .payments
            .insert_single(
                &mut *tx,
                client_id,
                number,
                payload.amount,
                payload.due_date,
                payload.payment_type,
            )
            .await?;

        let totals = self.reconcile_in(&mut tx, &client).await?;
        tx.commit().await?;

        Ok(PaymentMutation { payment, totals })
    }

    pub async fn delete_payment(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> Result<LedgerTotals, AppError> {
        let (mut tx, client) = self.begin_for_client(user, client_id).await?;

        let payment = self
            .payments
            .find_by_id(&mut *tx, client_id, payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)?;
        if !matches!(payment.payment_type, PaymentType::Deposit | PaymentType::Additional) {
            return Err(AppError::PaymentNotRemovable);
        }

        self.payments.delete(&mut *tx, client_id, payment_id).await?;
        let totals = self.reconcile_in(&mut tx, &client).await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Pagamento visível para o usuário (via contrato).
    pub async fn find_payment(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> Result<(Client, Payment), AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let client = self
            .clients
            .find_by_id(&self.pool, client_id, filter)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        let payment = self
            .payments
            .find_by_id(&self.pool, client_id, payment_id)
            .await?
            .ok_or(AppError::PaymentNotFound)?;
        Ok((client, payment))
    }

    pub async fn attach_receipt(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
        payload: &AttachReceiptPayload,
    ) -> Result<PaymentReceipt, AppError> {
        let (_, payment) = self.find_payment(user, client_id, payment_id).await?;
        self.receipts
            .create(payment.id, &payload.file_name, &payload.file_url, user.id)
            .await
    }

    pub async fn list_receipts(
        &self,
        user: &User,
        client_id: Uuid,
        payment_id: Uuid,
    ) -> Result<Vec<PaymentReceipt>, AppError> {
        let (_, payment) = self.find_payment(user, client_id, payment_id).await?;
        self.receipts.list_by_payment(payment.id).await
    }
}
