// src/services/ledger.rs
//
// Reconciliação dos agregados do contrato a partir do livro de parcelas.

use rust_decimal::Decimal;

use crate::models::payment::{LedgerTotals, Payment};

/// Recalcula `total_paid`, `remaining_amount` e `deposit_paid`.
///
/// Só linhas concluídas contam, pelo valor efetivo. O saldo nunca fica negativo.
pub fn reconcile(contract_amount: Decimal, payments: &[Payment]) -> LedgerTotals {
    let mut total_paid = Decimal::ZERO;
    let mut deposit_paid = Decimal::ZERO;

    for payment in payments.iter().filter(|p| p.is_completed) {
        let amount = payment.effective_amount();
        total_paid += amount;
        if payment.payment_type.is_deposit() {
            deposit_paid += amount;
        }
    }

    LedgerTotals {
        total_paid,
        remaining_amount: (contract_amount - total_paid).max(Decimal::ZERO),
        deposit_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            client::ContractTerms,
            payment::{fixtures, PaymentType},
        },
        services::schedule::generate_schedule,
    };
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn reference_ledger() -> Vec<Payment> {
        let client_id = Uuid::new_v4();
        let terms = ContractTerms {
            contract_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            first_payment: dec!(20000),
            monthly_payment: dec!(10000),
            installment_period: 10,
            payment_day: 15,
        };
        generate_schedule(&terms)
            .unwrap()
            .into_iter()
            .map(|r| fixtures::payment(client_id, r.payment_number, r.amount, r.due_date, r.payment_type))
            .collect()
    }

    #[test]
    fn untouched_ledger_owes_everything() {
        let totals = reconcile(dec!(120000), &reference_ledger());
        assert_eq!(totals, LedgerTotals {
            total_paid: Decimal::ZERO,
            remaining_amount: dec!(120000),
            deposit_paid: Decimal::ZERO,
        });
    }

    #[test]
    fn first_four_rows_paid() {
        let ledger: Vec<Payment> = reference_ledger()
            .into_iter()
            .map(|p| if p.payment_number <= 3 { fixtures::completed(p, Utc::now()) } else { p })
            .collect();

        let totals = reconcile(dec!(120000), &ledger);
        assert_eq!(totals.total_paid, dec!(50000));
        assert_eq!(totals.remaining_amount, dec!(70000));
        assert_eq!(totals.deposit_paid, dec!(20000));
    }

    #[test]
    fn custom_amount_replaces_original() {
        let mut ledger = reference_ledger();
        ledger[1].custom_amount = Some(dec!(12500));
        ledger[1] = fixtures::completed(ledger[1].clone(), Utc::now());

        let totals = reconcile(dec!(120000), &ledger);
        assert_eq!(totals.total_paid, dec!(12500));
        assert_eq!(totals.remaining_amount, dec!(107500));
    }

    #[test]
    fn overpayment_floors_remaining_at_zero() {
        let mut ledger: Vec<Payment> = reference_ledger()
            .into_iter()
            .map(|p| fixtures::completed(p, Utc::now()))
            .collect();
        let extra = fixtures::payment(
            ledger[0].client_id,
            11,
            dec!(5000),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            PaymentType::Additional,
        );
        ledger.push(fixtures::completed(extra, Utc::now()));

        let totals = reconcile(dec!(120000), &ledger);
        assert_eq!(totals.total_paid, dec!(125000));
        assert_eq!(totals.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn ad_hoc_deposit_counts_towards_deposit_paid() {
        let mut ledger = reference_ledger();
        let deposit = fixtures::payment(
            ledger[0].client_id,
            11,
            dec!(3000),
            NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            PaymentType::Deposit,
        );
        ledger.push(fixtures::completed(deposit, Utc::now()));

        let totals = reconcile(dec!(120000), &ledger);
        assert_eq!(totals.deposit_paid, dec!(3000));
        assert_eq!(totals.total_paid, dec!(3000));
    }

    #[test]
    fn invariant_holds_across_toggle_sequence() {
        let contract = dec!(120000);
        let mut ledger = reference_ledger();

        let check = |ledger: &[Payment], expected_paid: Decimal| {
            let totals = reconcile(contract, ledger);
            assert_eq!(totals.total_paid, expected_paid);
            assert_eq!(
                totals.remaining_amount,
                (contract - totals.total_paid).max(Decimal::ZERO)
            );
        };

        // Marca a parcela 2
        ledger[2] = fixtures::completed(ledger[2].clone(), Utc::now());
        check(&ledger, dec!(10000));

        // Desmarca
        ledger[2].is_completed = false;
        ledger[2].completed_at = None;
        check(&ledger, Decimal::ZERO);

        // Parcela 3 com valor negociado
        ledger[3].custom_amount = Some(dec!(15000));
        ledger[3] = fixtures::completed(ledger[3].clone(), Utc::now());
        check(&ledger, dec!(15000));

        // Quita tudo: 20 000 + 9 × 10 000 + 15 000 passa do contrato
        ledger = ledger
            .into_iter()
            .map(|p| if p.is_completed { p } else { fixtures::completed(p, Utc::now()) })
            .collect();
        check(&ledger, dec!(125000));
        assert_eq!(reconcile(contract, &ledger).remaining_amount, Decimal::ZERO);
    }
}
