// src/models/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive_amount"));
    }
    Ok(())
}

pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative_amount"));
    }
    Ok(())
}

/// Limiar de bônus: 0 a 1000 %.
pub fn percent_range(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::from(1000) {
        return Err(ValidationError::new("percent_range"));
    }
    Ok(())
}

/// Cada par é (valor enviado, pedido para apagar); os dois juntos se contradizem.
pub fn set_or_clear(pairs: &[(bool, bool)]) -> Result<(), ValidationError> {
    if pairs.iter().any(|&(set, clear)| set && clear) {
        return Err(ValidationError::new("set_and_clear"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(positive_amount(&dec!(0)).is_err());
        assert!(positive_amount(&dec!(-1)).is_err());
        assert!(positive_amount(&dec!(0.01)).is_ok());
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert!(non_negative_amount(&dec!(0)).is_ok());
        assert!(non_negative_amount(&dec!(-0.01)).is_err());
    }

    #[test]
    fn percent_range_bounds() {
        assert!(percent_range(&dec!(0)).is_ok());
        assert!(percent_range(&dec!(1000)).is_ok());
        assert!(percent_range(&dec!(1000.01)).is_err());
        assert!(percent_range(&dec!(-1)).is_err());
    }

    #[test]
    fn set_or_clear_rejects_both_on_the_same_field() {
        assert!(set_or_clear(&[(true, false), (false, true)]).is_ok());
        assert!(set_or_clear(&[(false, false), (true, true)]).is_err());
    }
}
