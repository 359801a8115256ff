use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::validate_horizon;
use crate::amortization::{crossover_period, generate_schedule, yearly_totals, Breakeven, LoanTerms};
use crate::error::MortgageCalcError;
use crate::time_value::{grow, percent_to_rate};
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for a rent-versus-buy comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub home_price: Money,
    pub down_payment: Money,
    pub annual_rate_percent: Percent,
    pub term_years: u32,
    pub monthly_rent: Money,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
    #[serde(default = "default_closing_cost")]
    pub closing_cost_percent: Percent,
    #[serde(default = "default_selling_cost")]
    pub selling_cost_percent: Percent,
    /// Annual property tax as a percent of home value
    #[serde(default = "default_property_tax")]
    pub property_tax_rate_percent: Percent,
    #[serde(default)]
    pub annual_insurance: Money,
    /// Annual upkeep as a percent of home value
    #[serde(default = "default_maintenance")]
    pub maintenance_rate_percent: Percent,
    #[serde(default)]
    pub monthly_hoa: Money,
    #[serde(default = "default_growth")]
    pub home_appreciation_percent: Percent,
    #[serde(default = "default_growth")]
    pub rent_growth_percent: Percent,
    #[serde(default)]
    pub renters_insurance_monthly: Money,
    /// Return earned on cash not tied up in the home
    #[serde(default = "default_investment_return")]
    pub investment_return_percent: Percent,
}

fn default_horizon() -> u32 {
    10
}
fn default_closing_cost() -> Percent {
    dec!(3)
}
fn default_selling_cost() -> Percent {
    dec!(6)
}
fn default_property_tax() -> Percent {
    dec!(1.1)
}
fn default_maintenance() -> Percent {
    dec!(1)
}
fn default_growth() -> Percent {
    dec!(3)
}
fn default_investment_return() -> Percent {
    dec!(5)
}

/// One year of the comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyYear {
    pub year: u32,
    pub home_value: Money,
    pub loan_balance: Money,
    pub buy_cost: Money,
    pub rent_cost: Money,
    /// Home value less loan balance and selling costs
    pub home_equity: Money,
    pub buyer_portfolio: Money,
    pub renter_portfolio: Money,
    pub buyer_net_worth: Money,
    pub renter_net_worth: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingChoice {
    Buy,
    Rent,
}

/// Output of a rent-versus-buy comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyOutput {
    pub loan_amount: Money,
    pub monthly_mortgage_payment: Money,
    pub upfront_cash: Money,
    pub years: Vec<RentVsBuyYear>,
    pub total_buy_cost: Money,
    pub total_rent_cost: Money,
    /// First year the buyer's net worth catches the renter's
    pub breakeven_year: Breakeven,
    /// Buyer net worth minus renter net worth at the horizon
    pub net_advantage_of_buying: Money,
    pub recommendation: HousingChoice,
}

/// Compare owning against renting and investing the difference.
pub fn compare_rent_vs_buy(input: &RentVsBuyInput) -> MortgageCalcResult<ComputationOutput<RentVsBuyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let loan = LoanTerms::new(
        input.home_price - input.down_payment,
        input.annual_rate_percent,
        input.term_years,
    );
    let schedule = generate_schedule(&loan, None)?;
    let mortgage_by_year = yearly_totals(&schedule.payment_stream(input.horizon_years * 12));

    let closing_costs = input.home_price * percent_to_rate(input.closing_cost_percent);
    let upfront_cash = input.down_payment + closing_costs;
    let invest_growth = Decimal::ONE + percent_to_rate(input.investment_return_percent);

    let mut renter_portfolio = upfront_cash;
    let mut buyer_portfolio = Decimal::ZERO;
    let mut years = Vec::with_capacity(input.horizon_years as usize);

    for year in 1..=input.horizon_years {
        let opening_value = grow(input.home_price, input.home_appreciation_percent, year - 1)?;
        let home_value = grow(input.home_price, input.home_appreciation_percent, year)?;

        let buy_cost = mortgage_by_year[year as usize - 1]
            + opening_value * percent_to_rate(input.property_tax_rate_percent)
            + opening_value * percent_to_rate(input.maintenance_rate_percent)
            + input.annual_insurance
            + input.monthly_hoa * dec!(12);
        let rent_cost = (grow(input.monthly_rent, input.rent_growth_percent, year - 1)?
            + input.renters_insurance_monthly)
            * dec!(12);

        // Whoever spends less invests the difference at year end
        renter_portfolio = renter_portfolio * invest_growth + (buy_cost - rent_cost).max(Decimal::ZERO);
        buyer_portfolio = buyer_portfolio * invest_growth + (rent_cost - buy_cost).max(Decimal::ZERO);

        let loan_balance = schedule.balance_after(year * 12);
        let home_equity =
            home_value - loan_balance - home_value * percent_to_rate(input.selling_cost_percent);

        years.push(RentVsBuyYear {
            year,
            home_value,
            loan_balance,
            buy_cost,
            rent_cost,
            home_equity,
            buyer_portfolio,
            renter_portfolio,
            buyer_net_worth: home_equity + buyer_portfolio,
            renter_net_worth: renter_portfolio,
        });
    }

    let buyer: Vec<Money> = years.iter().map(|y| y.buyer_net_worth).collect();
    let renter: Vec<Money> = years.iter().map(|y| y.renter_net_worth).collect();
    let breakeven_year = crossover_period(&buyer, &renter);
    if breakeven_year.is_never() {
        warnings.push(format!(
            "Buying does not overtake renting within {} years",
            input.horizon_years
        ));
    }

    let net_advantage_of_buying = years
        .last()
        .map(|y| y.buyer_net_worth - y.renter_net_worth)
        .unwrap_or(Decimal::ZERO);

    let output = RentVsBuyOutput {
        loan_amount: loan.principal,
        monthly_mortgage_payment: schedule.monthly_payment,
        upfront_cash,
        total_buy_cost: years.iter().map(|y| y.buy_cost).sum::<Money>() + closing_costs,
        total_rent_cost: years.iter().map(|y| y.rent_cost).sum(),
        years,
        breakeven_year,
        net_advantage_of_buying,
        recommendation: if net_advantage_of_buying >= Decimal::ZERO {
            HousingChoice::Buy
        } else {
            HousingChoice::Rent
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent vs buy: net worth of owner (equity net of selling costs plus invested savings) vs renter (invested upfront cash and savings)",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "home_appreciation_percent": input.home_appreciation_percent.to_string(),
            "rent_growth_percent": input.rent_growth_percent.to_string(),
            "investment_return_percent": input.investment_return_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &RentVsBuyInput) -> MortgageCalcResult<()> {
    if input.home_price <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "home_price".into(),
            reason: "Home price must be positive".into(),
        });
    }
    if input.down_payment < Decimal::ZERO || input.down_payment >= input.home_price {
        return Err(MortgageCalcError::InvalidInput {
            field: "down_payment".into(),
            reason: "Down payment must be at least zero and less than the home price".into(),
        });
    }
    if input.monthly_rent <= Decimal::ZERO {
        return Err(MortgageCalcError::InvalidInput {
            field: "monthly_rent".into(),
            reason: "Rent must be positive".into(),
        });
    }
    validate_horizon(input.horizon_years)?;
    for (field, value) in [
        ("closing_cost_percent", input.closing_cost_percent),
        ("selling_cost_percent", input.selling_cost_percent),
        ("property_tax_rate_percent", input.property_tax_rate_percent),
        ("maintenance_rate_percent", input.maintenance_rate_percent),
        ("annual_insurance", input.annual_insurance),
        ("monthly_hoa", input.monthly_hoa),
        ("renters_insurance_monthly", input.renters_insurance_monthly),
    ] {
        if value < Decimal::ZERO {
            return Err(MortgageCalcError::InvalidInput {
                field: field.into(),
                reason: "Cannot be negative".into(),
            });
        }
    }
    Ok(())
}
