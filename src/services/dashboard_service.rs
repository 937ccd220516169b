// src/services/dashboard_service.rs

use std::future::Future;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::{error::AppError, period::MonthWindow},
    db::{ClientRepository, PaymentRepository},
    models::{
        auth::{Permission, User},
        client::Client,
        dashboard::{MonthlyMetrics, YearOverview},
        payment::Payment,
    },
    services::{metrics::compute_monthly_metrics, webhook::WebhookDispatcher},
};

/// Sub-consulta do dashboard: se falhar, loga e segue com o valor padrão.
async fn best_effort<T, F>(label: &str, fut: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, AppError>>,
{
    match fut.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Dashboard: falha ao carregar {}: {}", label, e);
            T::default()
        }
    }
}

/// Recorte das métricas. Sem `metrics:company` só a própria carteira é visível;
/// pedir a de outra pessoa (ou a da empresa, passando o id alheio) é negado.
fn metrics_filter(user: &User, requested: Option<Uuid>) -> Result<Option<Uuid>, AppError> {
    if user.role.allows(Permission::ViewCompanyMetrics) {
        return Ok(requested);
    }
    match requested {
        None => Ok(Some(user.id)),
        Some(id) if id == user.id => Ok(Some(id)),
        Some(_) => Err(AppError::PermissionDenied(Permission::ViewCompanyMetrics)),
    }
}

#[derive(Clone)]
pub struct DashboardService {
    clients: ClientRepository,
    payments: PaymentRepository,
    webhook: WebhookDispatcher,
}

impl DashboardService {
    pub fn new(clients: ClientRepository, payments: PaymentRepository, webhook: WebhookDispatcher) -> Self {
        Self { clients, payments, webhook }
    }

    /// Contratos assinados até o fim do período e seus livros de parcelas.
    async fn load_portfolio(&self, until: &MonthWindow, employee_filter: Option<Uuid>) -> (Vec<Client>, Vec<Payment>) {
        let clients = best_effort(
            "contratos",
            self.clients.list_signed_until(until.last_day(), employee_filter),
        )
        .await;
        let ids: Vec<Uuid> = clients.iter().map(|c| c.id).collect();
        let payments = best_effort("parcelas", self.payments.list_by_clients(&ids)).await;
        (clients, payments)
    }

    pub async fn monthly_metrics(
        &self,
        user: &User,
        window: MonthWindow,
        requested_employee: Option<Uuid>,
    ) -> Result<MonthlyMetrics, AppError> {
        let filter = metrics_filter(user, requested_employee)?;
        let (clients, payments) = self.load_portfolio(&window, filter).await;
        Ok(compute_monthly_metrics(&clients, &payments, window))
    }

    pub async fn year_overview(
        &self,
        user: &User,
        year: i32,
        requested_employee: Option<Uuid>,
    ) -> Result<YearOverview, AppError> {
        let december = MonthWindow::new(year, 12)?;
        let filter = metrics_filter(user, requested_employee)?;

        // Uma carga só; cada mês filtra em memória
        let (clients, payments) = self.load_portfolio(&december, filter).await;
        let months = MonthWindow::months_of_year(year)
            .into_iter()
            .map(|window| compute_monthly_metrics(&clients, &payments, window))
            .collect();

        Ok(YearOverview { year, months })
    }

    /// Calcula o mês da empresa toda e publica no webhook.
    pub async fn sync_metrics(&self, user: &User, window: MonthWindow) -> MonthlyMetrics {
        let (clients, payments) = self.load_portfolio(&window, None).await;
        let metrics = compute_monthly_metrics(&clients, &payments, window);

        self.webhook.dispatch(
            "metrics_sync",
            user.id,
            json!({
                "year": window.year,
                "month": window.month,
                "total_clients": metrics.total_clients,
                "new_clients": metrics.new_clients,
                "completed_clients": metrics.completed_clients,
                "active_cases": metrics.active_cases,
                "plan_sum": metrics.plan_sum,
                "collected_sum": metrics.collected_sum,
                "collection_percent": metrics.collection_percent,
                "terminated_clients": metrics.terminated_clients,
                "suspended_clients": metrics.suspended_clients,
            }),
        );

        tracing::info!("📊 Métricas de {}/{} sincronizadas", window.month, window.year);
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;

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
    fn company_metrics_need_the_company_permission() {
        let admin = user(Role::Admin);
        let other = Uuid::new_v4();
        assert_eq!(metrics_filter(&admin, None).unwrap(), None);
        assert_eq!(metrics_filter(&admin, Some(other)).unwrap(), Some(other));

        let emp = user(Role::Employee);
        assert_eq!(metrics_filter(&emp, None).unwrap(), Some(emp.id));
        assert_eq!(metrics_filter(&emp, Some(emp.id)).unwrap(), Some(emp.id));
        assert!(matches!(
            metrics_filter(&emp, Some(other)),
            Err(AppError::PermissionDenied(Permission::ViewCompanyMetrics))
        ));
    }

    #[tokio::test]
    async fn best_effort_falls_back_to_default() {
        let failed: Vec<u32> = best_effort("teste", async { Err(AppError::InvalidPeriod) }).await;
        assert!(failed.is_empty());

        let ok: Vec<u32> = best_effort("teste", async { Ok(vec![1, 2]) }).await;
        assert_eq!(ok, vec![1, 2]);
    }
}
