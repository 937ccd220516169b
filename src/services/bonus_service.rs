// src/services/bonus_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, period::MonthWindow},
    db::{BonusRepository, ClientRepository, PaymentRepository, UserRepository},
    models::{
        auth::{AccessScope, Role, User},
        bonus::{BonusRule, CreateBonusRulePayload, EmployeeBonus},
    },
    services::{
        bonus::resolve_bonus,
        metrics::{collection_percent, compute_monthly_metrics},
    },
};

#[derive(Clone)]
pub struct BonusService {
    bonuses: BonusRepository,
    users: UserRepository,
    clients: ClientRepository,
    payments: PaymentRepository,
    pool: PgPool,
}

impl BonusService {
    pub fn new(
        bonuses: BonusRepository,
        users: UserRepository,
        clients: ClientRepository,
        payments: PaymentRepository,
        pool: PgPool,
    ) -> Self {
        Self { bonuses, users, clients, payments, pool }
    }

    pub async fn create_rule(&self, payload: &CreateBonusRulePayload) -> Result<BonusRule, AppError> {
        self.bonuses
            .create_rule(
                payload.employee_id,
                payload.role,
                payload.threshold_percent.round_dp(2),
                payload.bonus_amount,
            )
            .await
    }

    pub async fn list_rules(&self) -> Result<Vec<BonusRule>, AppError> {
        self.bonuses.list_rules().await
    }

    pub async fn delete_rule(&self, rule_id: Uuid) -> Result<(), AppError> {
        if self.bonuses.delete_rule(rule_id).await? == 0 {
            return Err(AppError::BonusRuleNotFound);
        }
        Ok(())
    }

    /// Apura o bônus de um funcionário no mês e grava (substituindo a apuração anterior).
    async fn compute_for(&self, employee: &User, window: &MonthWindow) -> Result<EmployeeBonus, AppError> {
        let clients = self
            .clients
            .list_signed_until(window.last_day(), Some(employee.id))
            .await?;
        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();
        let payments = self.payments.list_by_clients(&ids).await?;

        let metrics = compute_monthly_metrics(&clients, &payments, *window);
        let percent = collection_percent(metrics.collected_sum, metrics.plan_sum);

        let rules = self.bonuses.rules_for(employee.id, employee.role).await?;
        let amount = resolve_bonus(&rules, employee.id, percent);

        self.bonuses
            .upsert_bonus(employee.id, window, metrics.plan_sum, metrics.collected_sum, percent, amount)
            .await
    }

    /// Apura um funcionário específico ou todos os funcionários.
    pub async fn compute_bonuses(
        &self,
        window: MonthWindow,
        employee_id: Option<Uuid>,
    ) -> Result<Vec<EmployeeBonus>, AppError> {
        let employees = match employee_id {
            Some(id) => vec![self
                .users
                .find_by_id(&self.pool, id)
                .await?
                .ok_or(AppError::UserNotFound)?],
            None => self.users.list_by_role(Role::Employee).await?,
        };

        let mut results = Vec::with_capacity(employees.len());
        for employee in &employees {
            results.push(self.compute_for(employee, &window).await?);
        }

        tracing::info!(
            "💰 Bônus de {}/{} apurados para {} funcionário(s)",
            window.month,
            window.year,
            results.len()
        );
        Ok(results)
    }

    pub async fn list_bonuses(
        &self,
        user: &User,
        year: Option<i32>,
        month: Option<u32>,
        requested_employee: Option<Uuid>,
    ) -> Result<Vec<EmployeeBonus>, AppError> {
        let filter = AccessScope::for_user(user).narrow(requested_employee);
        self.bonuses
            .list_bonuses(filter, year, month.map(|m| m as i32))
            .await
    }
}
