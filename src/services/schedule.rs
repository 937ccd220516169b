// src/services/schedule.rs
//
// Gerador do cronograma de parcelas de um contrato.

use crate::{
    common::{error::AppError, period::add_months_on_day},
    models::{
        client::ContractTerms,
        payment::{PaymentType, ScheduledInstallment},
    },
};

/// Maior prazo aceito (50 anos de mensalidades).
pub const MAX_INSTALLMENT_PERIOD: i32 = 600;

/// Gera o cronograma completo: entrada (nº 0) na data do contrato e
/// `installment_period` mensalidades no `payment_day` dos meses seguintes.
///
/// Não confere se a soma bate com o valor do contrato; isso é do chamador.
pub fn generate_schedule(terms: &ContractTerms) -> Result<Vec<ScheduledInstallment>, AppError> {
    if terms.installment_period < 1 {
        return Err(AppError::InvalidContractTerms(
            "installment_period must be at least 1".into(),
        ));
    }
    if terms.installment_period > MAX_INSTALLMENT_PERIOD {
        return Err(AppError::InvalidContractTerms(format!(
            "installment_period must be at most {}",
            MAX_INSTALLMENT_PERIOD
        )));
    }
    if !(1..=31).contains(&terms.payment_day) {
        return Err(AppError::InvalidContractTerms(
            "payment_day must be between 1 and 31".into(),
        ));
    }

    let period = terms.installment_period as u32;
    let day = terms.payment_day as u32;

    let mut rows = Vec::with_capacity(period as usize + 1);
    rows.push(ScheduledInstallment {
        payment_number: 0,
        amount: terms.first_payment,
        due_date: terms.contract_date,
        payment_type: PaymentType::First,
    });

    for i in 1..=period {
        let due_date = add_months_on_day(terms.contract_date, i, day).ok_or_else(|| {
            AppError::InvalidContractTerms("schedule exceeds the supported calendar".into())
        })?;
        rows.push(ScheduledInstallment {
            payment_number: i as i32,
            amount: terms.monthly_payment,
            due_date,
            payment_type: PaymentType::Monthly,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn terms(contract_date: NaiveDate, period: i32, payment_day: i32) -> ContractTerms {
        ContractTerms {
            contract_date,
            first_payment: dec!(20000),
            monthly_payment: dec!(10000),
            installment_period: period,
            payment_day,
        }
    }

    #[test]
    fn reference_contract_produces_eleven_rows() {
        let rows = generate_schedule(&terms(d(2024, 1, 15), 10, 15)).unwrap();

        assert_eq!(rows.len(), 11);
        assert_eq!(rows[0].payment_number, 0);
        assert_eq!(rows[0].due_date, d(2024, 1, 15));
        assert_eq!(rows[0].amount, dec!(20000));
        assert_eq!(rows[0].payment_type, PaymentType::First);

        assert_eq!(rows[5].due_date, d(2024, 6, 15));
        assert_eq!(rows[5].amount, dec!(10000));
        assert_eq!(rows[5].payment_type, PaymentType::Monthly);

        let total: Decimal = rows.iter().map(|r| r.amount).sum();
        assert_eq!(total, dec!(120000));
    }

    #[test]
    fn numbers_and_dates_strictly_increase() {
        let rows = generate_schedule(&terms(d(2024, 1, 31), 14, 31)).unwrap();
        assert!(rows.windows(2).all(|w| w[0].payment_number < w[1].payment_number));
        assert!(rows.windows(2).all(|w| w[0].due_date < w[1].due_date));
    }

    #[test]
    fn day_31_clamps_to_end_of_short_months() {
        let rows = generate_schedule(&terms(d(2024, 1, 31), 3, 31)).unwrap();
        assert_eq!(rows[1].due_date, d(2024, 2, 29));
        assert_eq!(rows[2].due_date, d(2024, 3, 31));
        assert_eq!(rows[3].due_date, d(2024, 4, 30));
    }

    #[test]
    fn payment_day_overrides_contract_day() {
        let rows = generate_schedule(&terms(d(2024, 3, 10), 2, 20)).unwrap();
        assert_eq!(rows[0].due_date, d(2024, 3, 10));
        assert_eq!(rows[1].due_date, d(2024, 4, 20));
        assert_eq!(rows[2].due_date, d(2024, 5, 20));
    }

    #[test]
    fn rejects_invalid_terms() {
        assert!(matches!(
            generate_schedule(&terms(d(2024, 1, 15), 0, 15)),
            Err(AppError::InvalidContractTerms(_))
        ));
        assert!(matches!(
            generate_schedule(&terms(d(2024, 1, 15), 10, 0)),
            Err(AppError::InvalidContractTerms(_))
        ));
        assert!(matches!(
            generate_schedule(&terms(d(2024, 1, 15), 10, 32)),
            Err(AppError::InvalidContractTerms(_))
        ));
        assert!(matches!(
            generate_schedule(&terms(d(2024, 1, 15), MAX_INSTALLMENT_PERIOD + 1, 15)),
            Err(AppError::InvalidContractTerms(_))
        ));
        assert!(matches!(
            generate_schedule(&terms(d(2024, 1, 15), i32::MAX, 15)),
            Err(AppError::InvalidContractTerms(_))
        ));
    }

    #[test]
    fn longest_period_is_accepted() {
        let rows = generate_schedule(&terms(d(2024, 1, 15), MAX_INSTALLMENT_PERIOD, 15)).unwrap();
        assert_eq!(rows.len(), MAX_INSTALLMENT_PERIOD as usize + 1);
        assert_eq!(rows.last().unwrap().due_date, d(2074, 1, 15));
    }

    #[test]
    fn regenerating_yields_identical_rows() {
        let t = terms(d(2024, 1, 31), 12, 31);
        let first = generate_schedule(&t).unwrap();
        let second = generate_schedule(&t).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.payment_number, b.payment_number);
            assert_eq!(a.amount, b.amount);
            assert_eq!(a.due_date, b.due_date);
            assert_eq!(a.payment_type, b.payment_type);
        }
    }

    #[test]
    fn does_not_enforce_amount_sum() {
        let mut t = terms(d(2024, 1, 15), 10, 15);
        t.monthly_payment = dec!(7000);
        assert!(generate_schedule(&t).is_ok());
    }
}
