// src/services/status.rs
//
// Classificação de status do contrato. Toda listagem, detalhe e filtro
// passam por aqui.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    client::{Client, ClientStatus, ClientSummary},
    payment::Payment,
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `total_paid / contract_amount · 100`, duas casas. Contrato zerado conta como quitado.
pub fn completion_percent(total_paid: Decimal, contract_amount: Decimal) -> Decimal {
    if contract_amount <= Decimal::ZERO {
        return HUNDRED;
    }
    (total_paid / contract_amount * HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Existe parcela do plano (nº > 0) em aberto com vencimento anterior a hoje?
pub fn has_overdue_installment(payments: &[Payment], today: NaiveDate) -> bool {
    payments
        .iter()
        .any(|p| !p.is_completed && p.payment_number > 0 && p.due_date < today)
}

pub fn classify(client: &Client, payments: &[Payment], today: NaiveDate) -> ClientStatus {
    let percent = completion_percent(client.total_paid, client.contract_amount);

    if percent < HUNDRED && has_overdue_installment(payments, today) {
        ClientStatus::Overdue
    } else if percent >= HUNDRED {
        ClientStatus::Completed
    } else if percent >= Decimal::from(50) {
        ClientStatus::AlmostDone
    } else if percent > Decimal::ZERO {
        ClientStatus::InProgress
    } else {
        ClientStatus::NotStarted
    }
}

/// Próximo vencimento em aberto, qualquer que seja o tipo da linha.
pub fn next_due_date(payments: &[Payment]) -> Option<NaiveDate> {
    payments
        .iter()
        .filter(|p| !p.is_completed)
        .map(|p| p.due_date)
        .min()
}

/// Meses completos decorridos entre `from` e `to`.
fn full_months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to < from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// Estimativa de atraso pelo tempo de contrato: quanto já deveria ter sido pago
/// (entrada + mensalidades dos meses decorridos) menos o pago. Só informativa.
pub fn arrears_estimate(client: &Client, today: NaiveDate) -> Decimal {
    if today < client.contract_date {
        return Decimal::ZERO;
    }
    let elapsed = full_months_between(client.contract_date, today)
        .min(client.installment_period.max(0) as u32);
    let expected = client.first_payment + client.monthly_payment * Decimal::from(elapsed);
    (expected - client.total_paid).max(Decimal::ZERO)
}

pub fn summarize(client: Client, payments: &[Payment], today: NaiveDate) -> ClientSummary {
    ClientSummary {
        status: classify(&client, payments, today),
        completion_percent: completion_percent(client.total_paid, client.contract_amount),
        next_due_date: next_due_date(payments),
        client,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            client::fixtures::client,
            payment::{fixtures, PaymentType},
        },
        services::{ledger::reconcile, schedule::generate_schedule},
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ledger_for(c: &Client) -> Vec<Payment> {
        generate_schedule(&c.terms())
            .unwrap()
            .into_iter()
            .map(|r| fixtures::payment(c.id, r.payment_number, r.amount, r.due_date, r.payment_type))
            .collect()
    }

    /// Marca as linhas indicadas e atualiza os agregados do contrato.
    fn pay(c: &mut Client, ledger: &mut [Payment], numbers: &[i32]) {
        for p in ledger.iter_mut() {
            if numbers.contains(&p.payment_number) {
                *p = fixtures::completed(p.clone(), Utc::now());
            }
        }
        let totals = reconcile(c.contract_amount, ledger);
        c.total_paid = totals.total_paid;
        c.remaining_amount = totals.remaining_amount;
        c.deposit_paid = totals.deposit_paid;
    }

    #[test]
    fn percent_rounds_to_two_places() {
        assert_eq!(completion_percent(dec!(50000), dec!(120000)), dec!(41.67));
        assert_eq!(completion_percent(dec!(0), dec!(120000)), dec!(0));
        assert_eq!(completion_percent(dec!(0), dec!(0)), dec!(100));
    }

    #[test]
    fn fresh_contract_is_not_started() {
        let c = client(d(2024, 1, 15));
        let ledger = ledger_for(&c);
        assert_eq!(classify(&c, &ledger, d(2024, 1, 20)), ClientStatus::NotStarted);
    }

    #[test]
    fn unpaid_first_row_alone_is_not_overdue() {
        // A entrada (nº 0) não entra na checagem de atraso
        let c = client(d(2024, 1, 15));
        let ledger = ledger_for(&c);
        assert_eq!(classify(&c, &ledger, d(2024, 2, 10)), ClientStatus::NotStarted);
    }

    #[test]
    fn past_due_monthly_row_is_overdue() {
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        pay(&mut c, &mut ledger, &[0]);

        assert_eq!(classify(&c, &ledger, d(2024, 2, 15)), ClientStatus::InProgress);
        assert_eq!(classify(&c, &ledger, d(2024, 2, 16)), ClientStatus::Overdue);
    }

    #[test]
    fn progress_bands() {
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        let today = d(2024, 1, 16);

        pay(&mut c, &mut ledger, &[0]);
        assert_eq!(classify(&c, &ledger, today), ClientStatus::InProgress);

        pay(&mut c, &mut ledger, &[1, 2, 3, 4]);
        assert_eq!(c.total_paid, dec!(60000));
        assert_eq!(classify(&c, &ledger, today), ClientStatus::AlmostDone);
    }

    #[test]
    fn fully_paid_is_completed_even_with_open_rows() {
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        pay(&mut c, &mut ledger, &[0, 1, 2]);
        // Pagamento avulso quita o saldo, mas as mensalidades seguem em aberto
        c.total_paid = c.contract_amount;

        assert!(has_overdue_installment(&ledger, d(2025, 1, 1)));
        assert_eq!(classify(&c, &ledger, d(2025, 1, 1)), ClientStatus::Completed);
    }

    #[test]
    fn skipped_row_is_overdue_while_elapsed_estimate_shows_no_arrears() {
        // Pagou adiantado as parcelas 2..5, mas pulou a 1
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        pay(&mut c, &mut ledger, &[0, 2, 3, 4, 5]);
        let today = d(2024, 3, 1);

        assert_eq!(classify(&c, &ledger, today), ClientStatus::Overdue);
        assert_eq!(arrears_estimate(&c, today), Decimal::ZERO);
    }

    #[test]
    fn postponed_row_is_on_time_while_elapsed_estimate_shows_arrears() {
        // Parcela 1 foi reagendada para depois de hoje
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        pay(&mut c, &mut ledger, &[0]);
        ledger[1].due_date = d(2024, 4, 15);
        ledger[2].due_date = d(2024, 4, 16);
        let today = d(2024, 3, 20);

        assert_ne!(classify(&c, &ledger, today), ClientStatus::Overdue);
        assert_eq!(arrears_estimate(&c, today), dec!(20000));
    }

    #[test]
    fn arrears_estimate_caps_at_installment_period() {
        let c = client(d(2024, 1, 15));
        assert_eq!(arrears_estimate(&c, d(2023, 12, 1)), Decimal::ZERO);
        assert_eq!(arrears_estimate(&c, d(2024, 1, 15)), dec!(20000));
        assert_eq!(arrears_estimate(&c, d(2024, 2, 14)), dec!(20000));
        assert_eq!(arrears_estimate(&c, d(2024, 2, 15)), dec!(30000));
        assert_eq!(arrears_estimate(&c, d(2030, 1, 1)), dec!(120000));
    }

    #[test]
    fn next_due_date_ignores_completed_rows() {
        let mut c = client(d(2024, 1, 15));
        let mut ledger = ledger_for(&c);
        pay(&mut c, &mut ledger, &[0, 1]);
        assert_eq!(next_due_date(&ledger), Some(d(2024, 3, 15)));

        let extra = fixtures::payment(c.id, 11, dec!(1000), d(2024, 2, 1), PaymentType::Additional);
        ledger.push(extra);
        let summary = summarize(c, &ledger, d(2024, 1, 20));
        assert_eq!(summary.next_due_date, Some(d(2024, 2, 1)));
        assert_eq!(summary.completion_percent, dec!(25));
    }
}
