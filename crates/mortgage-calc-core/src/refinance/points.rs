use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::validate_horizon;
use crate::amortization::{generate_schedule, recovery_month, Breakeven, LoanTerms};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

fn default_reduction_per_point() -> Percent {
    dec!(0.25)
}

/// Input for a discount points analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsInput {
    /// Loan at the par (no points) rate
    #[serde(flatten)]
    pub loan: LoanTerms,
    /// Points purchased; one point costs 1% of the loan amount
    pub points: Decimal,
    #[serde(default = "default_reduction_per_point")]
    pub rate_reduction_per_point_percent: Percent,
    /// Quoted rate after points, overrides the per-point reduction
    #[serde(default)]
    pub discounted_rate_percent: Option<Percent>,
    /// Expected years before sale or refinance
    #[serde(default)]
    pub horizon_years: Option<u32>,
}

/// Output of a discount points analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsOutput {
    pub points_cost: Money,
    pub discounted_rate_percent: Percent,
    pub base_payment: Money,
    pub discounted_payment: Money,
    pub monthly_savings: Money,
    pub breakeven_month: Breakeven,
    pub interest_saved_full_term: Money,
    pub net_savings_full_term: Money,
    pub net_savings_at_horizon: Option<Money>,
    /// True when the points are recovered before the horizon (or term)
    pub worth_buying: bool,
}

/// Evaluate buying discount points at closing.
pub fn analyze_points(input: &PointsInput) -> MortgageCalcResult<ComputationOutput<PointsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let discounted_rate = match input.discounted_rate_percent {
        Some(rate) => rate,
        None => input.loan.annual_rate_percent - input.points * input.rate_reduction_per_point_percent,
    };
    if discounted_rate < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "points".into(),
            reason: "Points would reduce the rate below zero".into(),
        });
    }
    if discounted_rate >= input.loan.annual_rate_percent {
        warnings.push("Discounted rate is not below the base rate".into());
    }

    let points_cost = input.loan.principal * input.points / dec!(100);
    let discounted_terms = LoanTerms {
        annual_rate_percent: discounted_rate,
        ..input.loan.clone()
    };

    let base = generate_schedule(&input.loan, None)?;
    let discounted = generate_schedule(&discounted_terms, None)?;

    let term_months = input.loan.term_months();
    let savings: Vec<Money> = base
        .payment_stream(term_months)
        .iter()
        .zip(discounted.payment_stream(term_months).iter())
        .map(|(b, d)| *b - *d)
        .collect();
    let breakeven_month = recovery_month(points_cost, &savings);

    let interest_saved_full_term = base.total_interest() - discounted.total_interest();

    let net_savings_at_horizon = match input.horizon_years {
        Some(years) => {
            let months = (years * 12).min(term_months);
            // Payments saved plus the lower payoff owed at sale
            let paid_gap = base.paid_through(months) - discounted.paid_through(months);
            let balance_gap = base.balance_after(months) - discounted.balance_after(months);
            Some(paid_gap + balance_gap - points_cost)
        }
        None => None,
    };

    let decision_month = input.horizon_years.map(|y| y * 12).unwrap_or(term_months);
    let worth_buying = match breakeven_month {
        Breakeven::At(month) => month <= decision_month && points_cost > Decimal::ZERO,
        Breakeven::Never => false,
    };
    if let (Breakeven::At(month), Some(years)) = (breakeven_month, input.horizon_years) {
        if month > years * 12 {
            warnings.push(format!(
                "Points break even in month {} but the horizon ends at month {}",
                month,
                years * 12
            ));
        }
    }

    let output = PointsOutput {
        points_cost,
        discounted_rate_percent: discounted_rate,
        base_payment: base.monthly_payment,
        discounted_payment: discounted.monthly_payment,
        monthly_savings: base.monthly_payment - discounted.monthly_payment,
        breakeven_month,
        interest_saved_full_term,
        net_savings_full_term: interest_saved_full_term - points_cost,
        net_savings_at_horizon,
        worth_buying,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Discount points: upfront cost recovered from monthly payment savings",
        &serde_json::json!({
            "points": input.points.to_string(),
            "base_rate_percent": input.loan.annual_rate_percent.to_string(),
            "discounted_rate_percent": discounted_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &PointsInput) -> MortgageCalcResult<()> {
    input.loan.validate()?;
    if input.points < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "points".into(),
            reason: "Points cannot be negative".into(),
        });
    }
    if input.rate_reduction_per_point_percent < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "rate_reduction_per_point_percent".into(),
            reason: "Rate reduction cannot be negative".into(),
        });
    }
    if let Some(years) = input.horizon_years {
        validate_horizon(years)?;
    }
    Ok(())
}
