use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageCalcError;
use crate::types::{Money, Rate};
use crate::MortgageCalcResult;

/// Balances at or below this are treated as fully repaid.
pub const PAYOFF_TOLERANCE: Money = dec!(0.000001);

/// Outcome of advancing a loan by one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub interest: Money,
    /// Negative when the payment does not cover the interest.
    pub principal_applied: Money,
    pub new_balance: Money,
    /// Scheduled payment did not cover the month's interest.
    pub negative_amortization: bool,
}

/// Advance one month: accrue interest on the opening balance, then apply the
/// scheduled payment plus any extra. Principal applied never exceeds the
/// balance, so the final period cannot overpay into a negative balance.
pub fn amortize_month(
    balance: Money,
    monthly_rate: Rate,
    scheduled_payment: Money,
    extra: Money,
) -> MortgageCalcResult<StepResult> {
    if balance < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "balance".into(),
            reason: "Opening balance cannot be negative".into(),
        });
    }
    if monthly_rate < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }

    let interest = balance
        .checked_mul(monthly_rate)
        .ok_or_else(|| MortgageCalcError::overflow("balance", "monthly interest accrual"))?;
    let covered = scheduled_payment
        .checked_sub(interest)
        .ok_or_else(|| MortgageCalcError::overflow("scheduled_payment", "principal portion"))?;
    let negative_amortization = covered <= Decimal::ZERO;

    let mut principal_applied = covered
        .checked_add(extra)
        .ok_or_else(|| MortgageCalcError::overflow("extra", "principal applied"))?
        .min(balance);
    let mut new_balance = balance
        .checked_sub(principal_applied)
        .ok_or_else(|| MortgageCalcError::overflow("balance", "closing balance"))?;

    if new_balance <= PAYOFF_TOLERANCE {
        // Sweep rounding dust into the final payment
        principal_applied = balance;
        new_balance = Decimal::ZERO;
    }

    Ok(StepResult {
        interest,
        principal_applied,
        new_balance,
        negative_amortization,
    })
}
