// src/services/client_service.rs

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, period::MonthWindow},
    db::{client_repo::{ClientChanges, NewClient}, ClientRepository, PaymentRepository},
    models::{
        auth::{AccessScope, Permission, User},
        client::{
            Client, ClientDetail, ClientListQuery, ClientSummary, ContractTerms,
            CreateClientPayload, HistoryKind, ResetSchedulePayload, UpdateClientPayload,
        },
        payment::Payment,
    },
    services::{
        ledger::reconcile,
        schedule::generate_schedule,
        status::{arrears_estimate, classify, completion_percent, summarize},
        webhook::WebhookDispatcher,
    },
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn warn_if_unbalanced(client_label: &str, contract_amount: Decimal, terms: &ContractTerms) {
    let scheduled = terms.scheduled_total();
    if scheduled != contract_amount {
        tracing::warn!(
            "Cronograma de {} soma {} mas o contrato é de {}",
            client_label,
            scheduled,
            contract_amount
        );
    }
}

pub(crate) fn build_detail(client: Client, payments: Vec<Payment>, today: NaiveDate) -> ClientDetail {
    ClientDetail {
        status: classify(&client, &payments, today),
        completion_percent: completion_percent(client.total_paid, client.contract_amount),
        arrears_estimate: arrears_estimate(&client, today),
        client,
        payments,
    }
}

#[derive(Clone)]
pub struct ClientService {
    clients: ClientRepository,
    payments: PaymentRepository,
    webhook: WebhookDispatcher,
    pool: PgPool,
}

impl ClientService {
    pub fn new(
        clients: ClientRepository,
        payments: PaymentRepository,
        webhook: WebhookDispatcher,
        pool: PgPool,
    ) -> Self {
        Self { clients, payments, webhook, pool }
    }

    /// Responsável pelo contrato: funcionários só podem atribuir a si mesmos.
    fn resolve_owner(user: &User, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match (AccessScope::for_user(user), requested) {
            (AccessScope::All, requested) => Ok(requested.unwrap_or(user.id)),
            (AccessScope::Employee(id), Some(other)) if other != id => {
                Err(AppError::PermissionDenied(Permission::ReassignClients))
            }
            (AccessScope::Employee(id), _) => Ok(id),
        }
    }

    pub async fn create_client(
        &self,
        user: &User,
        payload: &CreateClientPayload,
    ) -> Result<ClientDetail, AppError> {
        let terms = payload.terms();
        let schedule = generate_schedule(&terms)?;
        warn_if_unbalanced(&payload.full_name, payload.contract_amount, &terms);

        let employee_id = Self::resolve_owner(user, payload.employee_id)?;
        let new = NewClient {
            full_name: &payload.full_name,
            phone: payload.phone.as_deref(),
            email: payload.email.as_deref(),
            notes: payload.notes.as_deref(),
            contract_amount: payload.contract_amount,
            terms,
            deposit_target: payload.deposit_target.unwrap_or(terms.first_payment),
            employee_id,
            user_id: user.id,
        };

        // Contrato e cronograma entram juntos
        let mut tx = self.pool.begin().await?;
        let client = self.clients.create(&mut *tx, &new).await?;
        let payments = self.payments.insert_schedule(&mut *tx, client.id, &schedule).await?;
        tx.commit().await?;

        tracing::info!(
            "📄 Contrato {} criado ({} parcelas) por {}",
            client.id,
            payments.len(),
            user.email
        );

        self.webhook.dispatch(
            "client_created",
            user.id,
            json!({
                "client_id": client.id,
                "client_name": client.full_name,
                "contract_amount": client.contract_amount,
                "employee_id": client.employee_id,
                "installments": payments.len(),
            }),
        );

        Ok(build_detail(client, payments, today()))
    }

    pub async fn list_clients(
        &self,
        user: &User,
        query: &ClientListQuery,
    ) -> Result<Vec<ClientSummary>, AppError> {
        let filter = AccessScope::for_user(user).narrow(query.employee_id);
        let clients = self.clients.list_active(filter).await?;

        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();
        let mut ledgers: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for payment in self.payments.list_by_clients(&ids).await? {
            ledgers.entry(payment.client_id).or_default().push(payment);
        }

        let today = today();
        let summaries = clients
            .into_iter()
            .map(|client| {
                let ledger = ledgers.remove(&client.id).unwrap_or_default();
                summarize(client, &ledger, today)
            })
            .filter(|s| query.status.is_none_or(|wanted| s.status == wanted))
            .collect();

        Ok(summaries)
    }

    pub async fn get_client(&self, user: &User, client_id: Uuid) -> Result<ClientDetail, AppError> {
        let scope = AccessScope::for_user(user);
        let client = self
            .clients
            .find_by_id(&self.pool, client_id, scope.employee_filter())
            .await?
            .ok_or(AppError::ClientNotFound)?;
        let payments = self.payments.list_by_client(&self.pool, client.id).await?;

        Ok(build_detail(client, payments, today()))
    }

    pub async fn update_client(
        &self,
        user: &User,
        client_id: Uuid,
        payload: &UpdateClientPayload,
    ) -> Result<ClientDetail, AppError> {
        let scope = AccessScope::for_user(user);

        let mut tx = self.pool.begin().await?;
        let current = self
            .clients
            .lock_by_id(&mut *tx, client_id, scope.employee_filter())
            .await?
            .ok_or(AppError::ClientNotFound)?;

        if payload.changes_schedule(&current.terms()) {
            return Err(AppError::ScheduleChangeRequiresReset);
        }

        let reassign = payload.employee_id.filter(|id| *id != current.employee_id);
        if reassign.is_some() && !user.role.allows(Permission::ReassignClients) {
            return Err(AppError::PermissionDenied(Permission::ReassignClients));
        }

        let changes = ClientChanges {
            full_name: payload.full_name.as_deref(),
            phone: payload.phone.as_deref(),
            email: payload.email.as_deref(),
            notes: payload.notes.as_deref(),
            clear_phone: payload.clear_phone,
            clear_email: payload.clear_email,
            clear_notes: payload.clear_notes,
            contract_amount: payload.contract_amount,
            deposit_target: payload.deposit_target,
            employee_id: reassign,
        };
        let mut client = self.clients.update_details(&mut *tx, client_id, &changes).await?;
        let payments = self.payments.list_by_client(&mut *tx, client_id).await?;

        // Novo valor de contrato muda o saldo devedor
        if client.contract_amount != current.contract_amount {
            let totals = reconcile(client.contract_amount, &payments);
            self.clients.update_totals(&mut *tx, client_id, &totals).await?;
            client.total_paid = totals.total_paid;
            client.remaining_amount = totals.remaining_amount;
            client.deposit_paid = totals.deposit_paid;
        }
        tx.commit().await?;

        Ok(build_detail(client, payments, today()))
    }

    /// Troca as condições e regenera o cronograma. Apaga o histórico de pagamentos.
    pub async fn reset_schedule(
        &self,
        user: &User,
        client_id: Uuid,
        payload: &ResetSchedulePayload,
    ) -> Result<ClientDetail, AppError> {
        if !payload.confirm {
            return Err(AppError::ResetNotConfirmed);
        }
        let terms = payload.terms();
        let schedule = generate_schedule(&terms)?;
        let scope = AccessScope::for_user(user);

        let mut tx = self.pool.begin().await?;
        let current = self
            .clients
            .lock_by_id(&mut *tx, client_id, scope.employee_filter())
            .await?
            .ok_or(AppError::ClientNotFound)?;

        let contract_amount = payload.contract_amount.unwrap_or(current.contract_amount);
        warn_if_unbalanced(&current.full_name, contract_amount, &terms);

        let removed = self.payments.delete_by_client(&mut *tx, client_id).await?;
        let client = self
            .clients
            .replace_terms(&mut *tx, client_id, contract_amount, &terms)
            .await?;
        let payments = self.payments.insert_schedule(&mut *tx, client_id, &schedule).await?;
        tx.commit().await?;

        tracing::warn!(
            "♻️ Cronograma do contrato {} redefinido por {}: {} parcelas descartadas",
            client_id,
            user.email,
            removed
        );

        Ok(build_detail(client, payments, today()))
    }

    pub async fn terminate_client(&self, user: &User, client_id: Uuid, reason: &str) -> Result<Client, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let client = self.clients.mark_terminated(client_id, reason, filter).await?;
        tracing::info!("Contrato {} rescindido por {}", client_id, user.email);
        Ok(client)
    }

    pub async fn suspend_client(&self, user: &User, client_id: Uuid, reason: &str) -> Result<Client, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        let client = self.clients.mark_suspended(client_id, reason, filter).await?;
        tracing::info!("Contrato {} suspenso por {}", client_id, user.email);
        Ok(client)
    }

    pub async fn reactivate_client(&self, user: &User, client_id: Uuid) -> Result<Client, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        self.clients.reactivate(client_id, filter).await
    }

    pub async fn delete_client(&self, user: &User, client_id: Uuid) -> Result<(), AppError> {
        if self.clients.delete(client_id).await? == 0 {
            return Err(AppError::ClientNotFound);
        }
        tracing::info!("🗑️ Contrato {} removido por {}", client_id, user.email);
        Ok(())
    }

    /// Rescindidos ou suspensos cujo evento caiu no mês.
    pub async fn history(
        &self,
        user: &User,
        kind: HistoryKind,
        window: &MonthWindow,
    ) -> Result<Vec<Client>, AppError> {
        let filter = AccessScope::for_user(user).employee_filter();
        self.clients.list_history(kind, window, filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ana@example.com".into(),
            password_hash: String::new(),
            full_name: "Ana".into(),
            phone: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn employees_own_their_contracts() {
        let emp = user(Role::Employee);
        assert_eq!(ClientService::resolve_owner(&emp, None).unwrap(), emp.id);
        assert_eq!(ClientService::resolve_owner(&emp, Some(emp.id)).unwrap(), emp.id);
        assert!(matches!(
            ClientService::resolve_owner(&emp, Some(Uuid::new_v4())),
            Err(AppError::PermissionDenied(Permission::ReassignClients))
        ));
    }

    #[test]
    fn admins_assign_anyone() {
        let admin = user(Role::Admin);
        let other = Uuid::new_v4();
        assert_eq!(ClientService::resolve_owner(&admin, Some(other)).unwrap(), other);
        assert_eq!(ClientService::resolve_owner(&admin, None).unwrap(), admin.id);
    }

    #[test]
    fn detail_reports_arrears_alongside_status() {
        use crate::models::client::{fixtures::client, ClientStatus};
        let c = client(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        let detail = build_detail(c, Vec::new(), NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(detail.status, ClientStatus::NotStarted);
        assert_eq!(detail.arrears_estimate, Decimal::from(40_000));
    }
}
