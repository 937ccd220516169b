// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common::period;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Clients ---
        handlers::clients::create_client,
        handlers::clients::list_clients,
        handlers::clients::client_history,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::reset_schedule,
        handlers::clients::delete_client,
        handlers::clients::terminate_client,
        handlers::clients::suspend_client,
        handlers::clients::reactivate_client,

        // --- Payments ---
        handlers::payments::list_payments,
        handlers::payments::add_payment,
        handlers::payments::set_completion,
        handlers::payments::update_payment,
        handlers::payments::delete_payment,
        handlers::payments::attach_receipt,
        handlers::payments::list_receipts,
        handlers::documents::generate_receipt_pdf,

        // --- Agents ---
        handlers::agents::create_agent,
        handlers::agents::list_agents,
        handlers::agents::get_agent,
        handlers::agents::update_agent,
        handlers::agents::toggle_installment,
        handlers::agents::delete_agent,

        // --- Dashboard ---
        handlers::dashboard::get_monthly_metrics,
        handlers::dashboard::get_year_overview,
        handlers::dashboard::sync_metrics,

        // --- Bonuses ---
        handlers::bonuses::create_rule,
        handlers::bonuses::list_rules,
        handlers::bonuses::delete_rule,
        handlers::bonuses::compute_bonuses,
        handlers::bonuses::list_bonuses,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Permission,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Clients ---
            models::client::Client,
            models::client::ClientStatus,
            models::client::ClientSummary,
            models::client::ClientDetail,
            models::client::CreateClientPayload,
            models::client::UpdateClientPayload,
            models::client::ResetSchedulePayload,
            models::client::LifecyclePayload,
            models::client::HistoryKind,

            // --- Payments ---
            models::payment::PaymentType,
            models::payment::Payment,
            models::payment::LedgerTotals,
            models::payment::PaymentMutation,
            models::payment::SetCompletionPayload,
            models::payment::UpdatePaymentPayload,
            models::payment::AddPaymentPayload,
            models::payment::PaymentReceipt,
            models::payment::AttachReceiptPayload,

            // --- Agents ---
            models::agent::Agent,
            models::agent::AgentInstallmentKind,
            models::agent::AgentInstallment,
            models::agent::AgentView,
            models::agent::CreateAgentPayload,
            models::agent::UpdateAgentPayload,
            models::agent::ToggleAgentInstallmentPayload,

            // --- Dashboard ---
            period::MonthWindow,
            models::dashboard::MonthlyMetrics,
            models::dashboard::YearOverview,

            // --- Bonuses ---
            models::bonus::BonusRule,
            models::bonus::EmployeeBonus,
            models::bonus::CreateBonusRulePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Usuários do escritório"),
        (name = "Clients", description = "Contratos e ciclo de vida"),
        (name = "Payments", description = "Parcelas, comprovantes e recibos"),
        (name = "Agents", description = "Agentes indicadores e suas parcelas"),
        (name = "Dashboard", description = "Indicadores mensais e anuais"),
        (name = "Bonuses", description = "Regras e apuração de bônus")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/auth/login",
            "/api/clients/{id}/payments/{payment_id}/completion",
            "/api/dashboard/metrics",
            "/api/bonuses/compute",
            "/api/agents/{id}/installments",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "faltou {}", expected);
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
