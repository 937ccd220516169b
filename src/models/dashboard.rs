// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::period::MonthWindow;

// Indicadores de um mês (cards do dashboard do administrador)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyMetrics {
    pub period: MonthWindow,

    // Carteira ativa no mês
    pub total_clients: i64,
    pub total_contract_amount: Decimal,
    /// Saldo devedor atual da carteira do mês (não é histórico).
    pub outstanding_amount: Decimal,
    /// Contratos ainda não quitados hoje, entre os ativos no mês.
    pub active_cases: i64,

    // Movimento do mês
    pub new_clients: i64,
    pub completed_clients: i64,

    // Plano x realizado
    pub plan_sum: Decimal,
    pub collected_sum: Decimal,
    pub collection_percent: Decimal,

    // Saídas da carteira no mês
    pub terminated_clients: i64,
    pub terminated_amount: Decimal,
    pub suspended_clients: i64,
    pub suspended_amount: Decimal,
}

impl MonthlyMetrics {
    /// Tudo zerado: usado quando a busca dos dados falha.
    pub fn empty(period: MonthWindow) -> Self {
        Self {
            period,
            total_clients: 0,
            total_contract_amount: Decimal::ZERO,
            outstanding_amount: Decimal::ZERO,
            active_cases: 0,
            new_clients: 0,
            completed_clients: 0,
            plan_sum: Decimal::ZERO,
            collected_sum: Decimal::ZERO,
            collection_percent: Decimal::ZERO,
            terminated_clients: 0,
            terminated_amount: Decimal::ZERO,
            suspended_clients: 0,
            suspended_amount: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearOverview {
    pub year: i32,
    pub months: Vec<MonthlyMetrics>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MetricsQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Filtra por responsável (somente administradores).
    pub employee_id: Option<Uuid>,
}
