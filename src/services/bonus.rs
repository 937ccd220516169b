// src/services/bonus.rs
//
// Faixas de bônus por desempenho de cobrança.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::bonus::BonusRule;

/// Escolhe o bônus de um funcionário para o percentual atingido.
///
/// Regras do próprio funcionário têm precedência sobre as do papel; entre as
/// aplicáveis vale a de maior limiar que não ultrapasse `percent`.
pub fn resolve_bonus(rules: &[BonusRule], employee_id: Uuid, percent: Decimal) -> Decimal {
    let personal: Vec<&BonusRule> = rules
        .iter()
        .filter(|r| r.employee_id == Some(employee_id))
        .collect();

    let candidates = if personal.is_empty() {
        rules.iter().filter(|r| r.employee_id.is_none()).collect()
    } else {
        personal
    };

    candidates
        .into_iter()
        .filter(|r| r.threshold_percent <= percent)
        .max_by_key(|r| r.threshold_percent)
        .map(|r| r.bonus_amount)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn rule(employee_id: Option<Uuid>, threshold: Decimal, amount: Decimal) -> BonusRule {
        BonusRule {
            id: Uuid::new_v4(),
            role: employee_id.is_none().then_some(Role::Employee),
            employee_id,
            threshold_percent: threshold,
            bonus_amount: amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn highest_reached_tier_wins() {
        let emp = Uuid::new_v4();
        let rules = vec![
            rule(None, dec!(80), dec!(500)),
            rule(None, dec!(100), dec!(1500)),
            rule(None, dec!(120), dec!(3000)),
        ];
        assert_eq!(resolve_bonus(&rules, emp, dec!(79.99)), Decimal::ZERO);
        assert_eq!(resolve_bonus(&rules, emp, dec!(80)), dec!(500));
        assert_eq!(resolve_bonus(&rules, emp, dec!(110)), dec!(1500));
        assert_eq!(resolve_bonus(&rules, emp, dec!(250)), dec!(3000));
    }

    #[test]
    fn personal_rules_replace_role_rules() {
        let emp = Uuid::new_v4();
        let other = Uuid::new_v4();
        let rules = vec![
            rule(None, dec!(50), dec!(400)),
            rule(Some(emp), dec!(90), dec!(2000)),
            rule(Some(other), dec!(10), dec!(9999)),
        ];
        // Funcionário com regra própria não cai na regra do papel
        assert_eq!(resolve_bonus(&rules, emp, dec!(60)), Decimal::ZERO);
        assert_eq!(resolve_bonus(&rules, emp, dec!(95)), dec!(2000));
        // Os demais seguem a regra do papel e ignoram regras alheias
        assert_eq!(resolve_bonus(&rules, Uuid::new_v4(), dec!(60)), dec!(400));
    }

    #[test]
    fn no_rules_means_no_bonus() {
        assert_eq!(resolve_bonus(&[], Uuid::new_v4(), dec!(100)), Decimal::ZERO);
    }
}
