use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageCalcError;
use crate::time_value::percent_to_rate;
use crate::types::{Money, Percent, Rate};
use crate::MortgageCalcResult;

/// Longest term the engine will simulate (50 years).
pub const MAX_TERM_YEARS: u32 = 50;

/// Core loan definition shared by every calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Annual nominal rate as a percent (6.5 = 6.5%)
    pub annual_rate_percent: Percent,
    pub term_years: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate_percent: Percent, term_years: u32) -> Self {
        LoanTerms {
            principal,
            annual_rate_percent,
            term_years,
        }
    }

    pub fn term_months(&self) -> u32 {
        self.term_years * 12
    }

    pub fn monthly_rate(&self) -> Rate {
        monthly_rate(self.annual_rate_percent)
    }

    /// Reject terms the engine cannot simulate.
    pub fn validate(&self) -> MortgageCalcResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: "annual_rate_percent".into(),
                reason: "Interest rate cannot be negative".into(),
            });
        }
        validate_term_years(self.term_years)
    }
}

pub(crate) fn validate_term_years(term_years: u32) -> MortgageCalcResult<()> {
    if term_years == 0 || term_years > MAX_TERM_YEARS {
        return Err(MortgageCalcError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term must be between 1 and {MAX_TERM_YEARS} years"),
        });
    }
    Ok(())
}

/// Comparison horizons share the term bound.
pub(crate) fn validate_horizon(horizon_years: u32) -> MortgageCalcResult<()> {
    if horizon_years == 0 || horizon_years > MAX_TERM_YEARS {
        return Err(MortgageCalcError::InvalidInput {
            field: "horizon_years".into(),
            reason: format!("Horizon must be between 1 and {MAX_TERM_YEARS} years"),
        });
    }
    Ok(())
}

/// Monthly periodic rate from an annual percent: p / 100 / 12.
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    percent_to_rate(annual_rate_percent) / dec!(12)
}

/// Level monthly payment for fully amortizing `terms`.
pub fn monthly_payment(terms: &LoanTerms) -> MortgageCalcResult<Money> {
    terms.validate()?;
    level_payment(terms.principal, terms.monthly_rate(), terms.term_months())
}

/// Level payment that retires `principal` over `months` at `monthly_rate`:
/// P * r(1+r)^n / ((1+r)^n - 1), or P / n when the rate is zero.
pub fn level_payment(principal: Money, monthly_rate: Rate, months: u32) -> MortgageCalcResult<Money> {
    if months == 0 {
        return Err(MortgageCalcError::InvalidInput {
            field: "months".into(),
            reason: "Number of payments must be > 0".into(),
        });
    }
    if monthly_rate < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }

    if monthly_rate.is_zero() {
        // Interest-free: straight-line amortisation
        return Ok(principal / Decimal::from(months));
    }

    let compound = (Decimal::ONE + monthly_rate)
        .checked_powi(i64::from(months))
        .ok_or_else(|| MortgageCalcError::overflow("annual_rate_percent", "payment compound factor"))?;

    let numerator = principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(compound))
        .ok_or_else(|| MortgageCalcError::overflow("principal", "payment numerator"))?;
    let denominator = compound - Decimal::ONE;

    if denominator.is_zero() {
        return Err(MortgageCalcError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    numerator
        .checked_div(denominator)
        .ok_or_else(|| MortgageCalcError::overflow("principal", "payment quotient"))
}

/// Largest principal a level `payment` can retire over `months`; the
/// inverse of [`level_payment`].
pub fn principal_for_payment(payment: Money, monthly_rate: Rate, months: u32) -> MortgageCalcResult<Money> {
    if months == 0 {
        return Err(MortgageCalcError::InvalidInput {
            field: "months".into(),
            reason: "Number of payments must be > 0".into(),
        });
    }
    if payment <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    if monthly_rate.is_zero() {
        return Ok(payment * Decimal::from(months));
    }

    let compound = (Decimal::ONE + monthly_rate)
        .checked_powi(i64::from(months))
        .ok_or_else(|| MortgageCalcError::overflow("annual_rate_percent", "annuity factor"))?;
    let annuity_factor = (Decimal::ONE - Decimal::ONE / compound) / monthly_rate;
    payment
        .checked_mul(annuity_factor)
        .ok_or_else(|| MortgageCalcError::overflow("payment", "present value of payments"))
}
