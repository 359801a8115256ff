use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageCalcError;
use crate::types::{Money, Percent, Rate};
use crate::MortgageCalcResult;

/// Convert a borrower-facing percent (6.5) into a decimal rate (0.065).
pub fn percent_to_rate(p: Percent) -> Rate {
    p / dec!(100)
}

/// `(1 + rate)^periods` with overflow reported as invalid input.
pub fn growth_factor(rate: Rate, periods: u32) -> MortgageCalcResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(MortgageCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Growth rate must be greater than -100%".into(),
        });
    }
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| MortgageCalcError::overflow("rate", "compound growth factor"))
}

/// Value of `amount` after `years` of annual growth at `annual_percent`.
pub fn grow(amount: Money, annual_percent: Percent, years: u32) -> MortgageCalcResult<Money> {
    let factor = growth_factor(percent_to_rate(annual_percent), years)?;
    amount
        .checked_mul(factor)
        .ok_or_else(|| MortgageCalcError::overflow("amount", "compound growth"))
}

/// Net Present Value of a series of cash flows, first flow undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> MortgageCalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(MortgageCalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| MortgageCalcError::overflow("rate", "NPV discount factor"))?;
        }
        if discount.is_zero() {
            return Err(MortgageCalcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_grow_compounds_annually() {
        let grown = grow(dec!(100000), dec!(3), 2).unwrap();
        assert_eq!(grown, dec!(106090));
    }

    #[test]
    fn test_growth_factor_rejects_total_loss() {
        assert!(growth_factor(dec!(-1), 5).is_err());
    }

    #[test]
    fn test_growth_factor_overflow_is_invalid_input() {
        let err = growth_factor(dec!(1000), 600).unwrap_err();
        assert!(matches!(err, MortgageCalcError::InvalidInput { .. }));
    }
}
