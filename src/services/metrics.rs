// src/services/metrics.rs
//
// Indicadores mensais do dashboard, calculados em memória sobre os contratos
// e o livro de parcelas já carregados.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::period::MonthWindow,
    models::{client::Client, dashboard::MonthlyMetrics, payment::Payment},
};

/// Percentual do plano realizado, duas casas. Plano zerado ⇒ 0.
pub fn collection_percent(collected: Decimal, plan: Decimal) -> Decimal {
    if plan <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (collected / plan * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Soma do plano: a mensalidade de cada contrato ativo que tem parcela do plano
/// vencendo no mês, exceto os assinados no próprio mês.
fn plan_contribution(client: &Client, ledger: &[&Payment], window: &MonthWindow) -> Decimal {
    if window.contains(client.contract_date) {
        return Decimal::ZERO;
    }
    let due_in_month = ledger
        .iter()
        .any(|p| p.payment_number > 0 && window.contains(p.due_date));
    if due_in_month {
        client.monthly_payment
    } else {
        Decimal::ZERO
    }
}

/// Quitado e com o último pagamento concluído dentro do mês.
fn completed_in(client: &Client, ledger: &[&Payment], window: &MonthWindow) -> bool {
    if client.total_paid < client.contract_amount {
        return false;
    }
    ledger
        .iter()
        .filter_map(|p| p.completed_at.filter(|_| p.is_completed))
        .max()
        .is_some_and(|last| window.contains_instant(last))
}

fn collected_in(ledger: &[&Payment], window: &MonthWindow) -> Decimal {
    ledger
        .iter()
        .filter(|p| p.is_completed && p.payment_number > 0)
        .filter(|p| p.completed_at.is_some_and(|at| window.contains_instant(at)))
        .map(|p| p.effective_amount())
        .sum()
}

/// Indicadores de um mês para os contratos e parcelas informados.
///
/// `outstanding_amount` e `active_cases` vêm dos agregados atuais do contrato
/// (`remaining_amount`, `total_paid`), não de uma foto do fim do mês: consultar um
/// mês passado mostra o saldo de hoje dos contratos que estavam na carteira.
pub fn compute_monthly_metrics(
    clients: &[Client],
    payments: &[Payment],
    window: MonthWindow,
) -> MonthlyMetrics {
    let mut ledgers: HashMap<Uuid, Vec<&Payment>> = HashMap::new();
    for payment in payments {
        ledgers.entry(payment.client_id).or_default().push(payment);
    }
    let no_rows: Vec<&Payment> = Vec::new();

    let mut metrics = MonthlyMetrics::empty(window);

    for client in clients {
        let ledger = ledgers.get(&client.id).unwrap_or(&no_rows);

        // Saídas da carteira contam pelo mês do evento
        if client.is_terminated && client.terminated_at.is_some_and(|at| window.contains_instant(at)) {
            metrics.terminated_clients += 1;
            metrics.terminated_amount += client.contract_amount;
        }
        if client.is_suspended && client.suspended_at.is_some_and(|at| window.contains_instant(at)) {
            metrics.suspended_clients += 1;
            metrics.suspended_amount += client.contract_amount;
        }

        if !client.was_active_during(&window) {
            continue;
        }

        metrics.total_clients += 1;
        metrics.total_contract_amount += client.contract_amount;
        metrics.outstanding_amount += client.remaining_amount;
        if client.total_paid < client.contract_amount {
            metrics.active_cases += 1;
        }
        if window.contains(client.contract_date) {
            metrics.new_clients += 1;
        }
        if completed_in(client, ledger, &window) {
            metrics.completed_clients += 1;
        }

        metrics.plan_sum += plan_contribution(client, ledger, &window);
        metrics.collected_sum += collected_in(ledger, &window);
    }

    metrics.collection_percent = collection_percent(metrics.collected_sum, metrics.plan_sum);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            client::fixtures::client,
            payment::{fixtures, PaymentType},
        },
        services::schedule::generate_schedule,
    };
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(y: i32, m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, 12, 0, 0).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthWindow {
        MonthWindow::new(y, m).unwrap()
    }

    fn ledger_for(c: &Client) -> Vec<Payment> {
        generate_schedule(&c.terms())
            .unwrap()
            .into_iter()
            .map(|r| fixtures::payment(c.id, r.payment_number, r.amount, r.due_date, r.payment_type))
            .collect()
    }

    #[test]
    fn new_client_is_excluded_from_plan_in_signing_month() {
        let mut c = client(d(2024, 3, 10));
        c.payment_day = 20;
        let ledger = vec![
            fixtures::payment(c.id, 0, dec!(20000), d(2024, 3, 10), PaymentType::First),
            fixtures::payment(c.id, 1, dec!(10000), d(2024, 3, 20), PaymentType::Monthly),
            fixtures::payment(c.id, 2, dec!(10000), d(2024, 4, 20), PaymentType::Monthly),
        ];
        let clients = [c];

        let march = compute_monthly_metrics(&clients, &ledger, month(2024, 3));
        assert_eq!(march.plan_sum, Decimal::ZERO);
        assert_eq!(march.new_clients, 1);

        let april = compute_monthly_metrics(&clients, &ledger, month(2024, 4));
        assert_eq!(april.plan_sum, dec!(10000));
        assert_eq!(april.new_clients, 0);
    }

    #[test]
    fn first_row_alone_does_not_put_client_in_plan() {
        let c = client(d(2024, 1, 15));
        let ledger = vec![fixtures::payment(c.id, 0, dec!(20000), d(2024, 2, 15), PaymentType::First)];
        let m = compute_monthly_metrics(&[c], &ledger, month(2024, 2));
        assert_eq!(m.plan_sum, Decimal::ZERO);
    }

    #[test]
    fn collected_counts_completion_month_and_skips_first_row() {
        let c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        ledger[0] = fixtures::completed(ledger[0].clone(), at(2024, 2, 2));
        ledger[1] = fixtures::completed(ledger[1].clone(), at(2024, 2, 14));
        ledger[2].custom_amount = Some(dec!(9000));
        ledger[2] = fixtures::completed(ledger[2].clone(), at(2024, 3, 1));
        let clients = [c];

        let feb = compute_monthly_metrics(&clients, &ledger, month(2024, 2));
        assert_eq!(feb.plan_sum, dec!(10000));
        assert_eq!(feb.collected_sum, dec!(10000));
        assert_eq!(feb.collection_percent, dec!(100));

        let mar = compute_monthly_metrics(&clients, &ledger, month(2024, 3));
        assert_eq!(mar.collected_sum, dec!(9000));
        assert_eq!(mar.collection_percent, dec!(90));
    }

    #[test]
    fn terminated_client_counts_until_its_month() {
        let mut c = client(d(2024, 1, 15));
        c.is_terminated = true;
        c.terminated_at = Some(at(2024, 4, 2));
        let clients = [c];

        let march = compute_monthly_metrics(&clients, &[], month(2024, 3));
        assert_eq!(march.total_clients, 1);
        assert_eq!(march.terminated_clients, 0);

        let april = compute_monthly_metrics(&clients, &[], month(2024, 4));
        assert_eq!(april.total_clients, 0);
        assert_eq!(april.terminated_clients, 1);
        assert_eq!(april.terminated_amount, dec!(120000));
    }

    #[test]
    fn suspended_totals_use_suspension_month() {
        let mut c = client(d(2024, 1, 15));
        c.is_suspended = true;
        c.suspended_at = Some(at(2024, 5, 30));
        let m = compute_monthly_metrics(&[c], &[], month(2024, 5));
        assert_eq!(m.suspended_clients, 1);
        assert_eq!(m.suspended_amount, dec!(120000));
        assert_eq!(m.total_clients, 0);
    }

    #[test]
    fn completed_this_month_uses_latest_completion() {
        let mut c = client(d(2024, 1, 15));
        let ledger: Vec<Payment> = ledger_for(&c)
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let when = if i == 10 { at(2024, 6, 3) } else { at(2024, 5, 1) };
                fixtures::completed(p, when)
            })
            .collect();
        c.total_paid = dec!(120000);
        c.remaining_amount = Decimal::ZERO;
        let clients = [c];

        let may = compute_monthly_metrics(&clients, &ledger, month(2024, 5));
        assert_eq!(may.completed_clients, 0);
        let june = compute_monthly_metrics(&clients, &ledger, month(2024, 6));
        assert_eq!(june.completed_clients, 1);
        assert_eq!(june.active_cases, 0);
    }

    #[test]
    fn portfolio_totals() {
        let mut a = client(d(2024, 1, 15));
        a.total_paid = dec!(50000);
        a.remaining_amount = dec!(70000);
        let b = client(d(2024, 2, 1));
        let future = client(d(2024, 7, 1));

        let m = compute_monthly_metrics(&[a, b, future], &[], month(2024, 2));
        assert_eq!(m.total_clients, 2);
        assert_eq!(m.total_contract_amount, dec!(240000));
        assert_eq!(m.outstanding_amount, dec!(190000));
        assert_eq!(m.active_cases, 2);
        assert_eq!(m.new_clients, 1);
    }

    #[test]
    fn empty_plan_yields_zero_percent() {
        assert_eq!(collection_percent(dec!(500), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(collection_percent(dec!(1), dec!(3)), dec!(33.33));
    }

    #[test]
    fn past_months_report_current_balances() {
        let mut c = client(d(2024, 1, 15));
        // Quitado em junho; em fevereiro ainda devia quase tudo
        c.total_paid = dec!(120000);
        c.remaining_amount = Decimal::ZERO;

        let feb = compute_monthly_metrics(&[c], &[], month(2024, 2));
        assert_eq!(feb.total_clients, 1);
        assert_eq!(feb.outstanding_amount, Decimal::ZERO);
        assert_eq!(feb.active_cases, 0);
    }
}
