use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::validate_horizon;
use crate::amortization::{crossover_period, cumulative, generate_schedule, yearly_totals, Breakeven, LoanTerms};
use crate::error::MortgageCalcError;
use crate::time_value::grow;
use crate::types::*;
use crate::MortgageCalcResult;

fn default_rent_growth() -> Percent {
    dec!(3)
}
fn default_horizon() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentSimInput {
    pub monthly_rent: Money,
    #[serde(default = "default_rent_growth")]
    pub rent_growth_percent: Percent,
    /// Taxes, insurance, upkeep and any other non-loan ownership cost per month
    pub monthly_ownership_cost: Money,
    #[serde(default)]
    pub ownership_cost_growth_percent: Percent,
    /// Adds principal and interest, which stop once the loan is paid off
    #[serde(default)]
    pub loan: Option<LoanTerms>,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentSimYear {
    pub year: u32,
    pub monthly_rent: Money,
    pub annual_rent: Money,
    pub annual_ownership_cost: Money,
    pub cumulative_rent: Money,
    pub cumulative_ownership_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentSimOutput {
    pub years: Vec<RentSimYear>,
    /// First year a single year's rent is at least that year's ownership cost
    pub annual_crossover_year: Breakeven,
    /// First year total rent paid is at least total ownership cost
    pub cumulative_crossover_year: Breakeven,
    pub total_rent: Money,
    pub total_ownership_cost: Money,
    /// Positive when renting cost more over the horizon
    pub rent_minus_ownership: Money,
}

/// Project rent growth against the cost of owning and find where the lines
/// cross.
pub fn simulate_rent(input: &RentSimInput) -> MortgageCalcResult<ComputationOutput<RentSimOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let horizon_months = input.horizon_years * 12;
    let loan_payments: Vec<Money> = match &input.loan {
        Some(terms) => yearly_totals(&generate_schedule(terms, None)?.payment_stream(horizon_months)),
        None => vec![Decimal::ZERO; input.horizon_years as usize],
    };

    let mut annual_rent = Vec::with_capacity(input.horizon_years as usize);
    let mut annual_ownership = Vec::with_capacity(input.horizon_years as usize);
    let mut monthly_rents = Vec::with_capacity(input.horizon_years as usize);
    for year in 0..input.horizon_years {
        let rent = grow(input.monthly_rent, input.rent_growth_percent, year)?;
        let other = grow(input.monthly_ownership_cost, input.ownership_cost_growth_percent, year)?;
        monthly_rents.push(rent);
        annual_rent.push(rent * dec!(12));
        annual_ownership.push(other * dec!(12) + loan_payments.get(year as usize).copied().unwrap_or_default());
    }

    let cumulative_rent = cumulative(&annual_rent);
    let cumulative_ownership = cumulative(&annual_ownership);
    let annual_crossover_year = crossover_period(&annual_rent, &annual_ownership);
    let cumulative_crossover_year = crossover_period(&cumulative_rent, &cumulative_ownership);

    if cumulative_crossover_year.is_never() {
        warnings.push(format!(
            "Cumulative rent stays below ownership cost for all {} years",
            input.horizon_years
        ));
    }

    let years: Vec<RentSimYear> = (0..input.horizon_years as usize)
        .map(|i| RentSimYear {
            year: i as u32 + 1,
            monthly_rent: monthly_rents[i],
            annual_rent: annual_rent[i],
            annual_ownership_cost: annual_ownership[i],
            cumulative_rent: cumulative_rent[i],
            cumulative_ownership_cost: cumulative_ownership[i],
        })
        .collect();

    let total_rent = cumulative_rent.last().copied().unwrap_or_default();
    let total_ownership_cost = cumulative_ownership.last().copied().unwrap_or_default();

    let output = RentSimOutput {
        years,
        annual_crossover_year,
        cumulative_crossover_year,
        total_rent,
        total_ownership_cost,
        rent_minus_ownership: total_rent - total_ownership_cost,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent simulator: compounding rent vs ownership cost, annual and cumulative crossover",
        &serde_json::json!({
            "rent_growth_percent": input.rent_growth_percent.to_string(),
            "ownership_cost_growth_percent": input.ownership_cost_growth_percent.to_string(),
            "horizon_years": input.horizon_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &RentSimInput) -> MortgageCalcResult<()> {
    if input.monthly_rent <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "monthly_rent".into(),
            reason: "Rent must be positive".into(),
        });
    }
    if input.monthly_ownership_cost < Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "monthly_ownership_cost".into(),
            reason: "Ownership cost cannot be negative".into(),
        });
    }
    if let Some(loan) = &input.loan {
        loan.validate()?;
    }
    validate_horizon(input.horizon_years)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> RentSimInput {
        RentSimInput {
            monthly_rent: dec!(800),
            rent_growth_percent: dec!(5),
            monthly_ownership_cost: dec!(1000),
            ownership_cost_growth_percent: Decimal::ZERO,
            loan: None,
            horizon_years: 10,
        }
    }

    #[test]
    fn test_growing_rent_overtakes_flat_ownership() {
        let out = simulate_rent(&sample_input()).unwrap().result;
        assert_eq!(out.annual_crossover_year, Breakeven::At(6));
        assert_eq!(out.cumulative_crossover_year, Breakeven::At(10));
        assert_eq!(out.years.len(), 10);
        assert_eq!(out.years[0].annual_rent, dec!(9600));
        assert!(out.rent_minus_ownership >= Decimal::ZERO);
    }

    #[test]
    fn test_short_horizon_never_crosses() {
        let mut input = sample_input();
        input.horizon_years = 8;
        let out = simulate_rent(&input).unwrap();
        assert_eq!(out.result.cumulative_crossover_year, Breakeven::Never);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_flat_rent_never_crosses() {
        let mut input = sample_input();
        input.rent_growth_percent = Decimal::ZERO;
        let out = simulate_rent(&input).unwrap().result;
        assert_eq!(out.annual_crossover_year, Breakeven::Never);
        assert_eq!(out.cumulative_crossover_year, Breakeven::Never);
    }

    #[test]
    fn test_loan_payments_stop_after_payoff() {
        let mut input = sample_input();
        input.monthly_ownership_cost = dec!(200);
        input.loan = Some(LoanTerms::new(dec!(60000), dec!(5), 5));
        input.horizon_years = 8;
        let out = simulate_rent(&input).unwrap().result;
        assert!(out.years[4].annual_ownership_cost > dec!(15000));
        assert_eq!(out.years[5].annual_ownership_cost, dec!(2400));
        assert_eq!(out.annual_crossover_year, Breakeven::At(6));
    }

    #[test]
    fn test_rejects_zero_rent() {
        let mut input = sample_input();
        input.monthly_rent = Decimal::ZERO;
        assert!(simulate_rent(&input).is_err());
    }
}
