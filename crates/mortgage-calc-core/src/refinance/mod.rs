pub mod buydown;
pub mod heloc_vs_refi;
pub mod points;
pub mod refi_breakeven;

use crate::amortization::payment::MAX_TERM_YEARS;
use crate::amortization::{level_payment, monthly_rate, AmortizationSchedule, Amortizer, NoExtra};
use crate::error::MortgageCalcError;
use crate::types::{Money, Percent};
use crate::MortgageCalcResult;
use rust_decimal::Decimal;

/// An existing loan re-amortized from its current balance over the months
/// it has left.
pub(crate) fn existing_loan_schedule(
    balance: Money,
    rate_percent: Percent,
    remaining_months: u32,
) -> MortgageCalcResult<AmortizationSchedule> {
    if balance <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "current_balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if remaining_months == 0 || remaining_months > MAX_TERM_YEARS * 12 {
        return Err(MortgageCalcError::InvalidInput {
            field: "current_remaining_months".into(),
            reason: format!("Remaining term must be between 1 and {} months", MAX_TERM_YEARS * 12),
        });
    }
    if rate_percent < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "current_rate_percent".into(),
            reason: "Rate cannot be negative".into(),
        });
    }
    let r = monthly_rate(rate_percent);
    let payment = level_payment(balance, r, remaining_months)?;
    Amortizer::with_payment(balance, r, payment, remaining_months, NoExtra)?.run()
}
