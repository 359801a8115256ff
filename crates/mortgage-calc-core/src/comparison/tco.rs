use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::payment::validate_horizon;
use crate::amortization::{generate_schedule, yearly_totals, AmortizationSchedule, LoanTerms};
use crate::error::MortgageCalcError;
use crate::time_value::{grow, npv, percent_to_rate};
use crate::types::*;
use crate::MortgageCalcResult;

/// Input for total cost of ownership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcoInput {
    pub home_price: Money,
    pub down_payment: Money,
    pub annual_rate_percent: Percent,
    pub term_years: u32,
    #[serde(default = "default_horizon")]
    pub horizon_years: u32,
    #[serde(default = "default_closing_cost")]
    pub closing_cost_percent: Percent,
    #[serde(default = "default_property_tax")]
    pub property_tax_rate_percent: Percent,
    #[serde(default)]
    pub annual_insurance: Money,
    #[serde(default)]
    pub monthly_hoa: Money,
    #[serde(default = "default_maintenance")]
    pub maintenance_rate_percent: Percent,
    /// Charged while LTV on the purchase price is above 78%
    #[serde(default = "default_pmi_rate")]
    pub pmi_annual_rate_percent: Percent,
    #[serde(default = "default_appreciation")]
    pub home_appreciation_percent: Percent,
    #[serde(default = "default_selling_cost")]
    pub selling_cost_percent: Percent,
    /// Rate used to discount yearly outflows
    #[serde(default)]
    pub discount_rate_percent: Percent,
}

fn default_horizon() -> u32 {
    10
}
fn default_closing_cost() -> Percent {
    dec!(3)
}
fn default_property_tax() -> Percent {
    dec!(1.1)
}
fn default_maintenance() -> Percent {
    dec!(1)
}
fn default_pmi_rate() -> Percent {
    dec!(0.5)
}
fn default_appreciation() -> Percent {
    dec!(3)
}
fn default_selling_cost() -> Percent {
    dec!(6)
}

/// LTV below which PMI is cancelled automatically
const PMI_CANCEL_LTV: Decimal = dec!(0.78);
const PMI_REQUIRED_LTV: Decimal = dec!(0.80);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcoYear {
    pub year: u32,
    pub principal: Money,
    pub interest: Money,
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
    pub maintenance: Money,
    pub pmi: Money,
    pub total: Money,
}

/// Output of total cost of ownership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcoOutput {
    pub monthly_principal_and_interest: Money,
    pub upfront_cash: Money,
    pub years: Vec<TcoYear>,
    /// Sum of every cost category over the horizon
    pub totals: TcoYear,
    pub total_outflow: Money,
    pub home_value_at_horizon: Money,
    pub loan_balance_at_horizon: Money,
    /// Net of selling costs
    pub equity_at_horizon: Money,
    /// Outflow less recovered equity
    pub net_cost: Money,
    pub effective_monthly_cost: Money,
    pub npv_of_outflows: Money,
}

/// Everything owning the home costs over the horizon, and what comes back.
pub fn calculate_tco(input: &TcoInput) -> MortgageCalcResult<ComputationOutput<TcoOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let loan = LoanTerms::new(
        input.home_price - input.down_payment,
        input.annual_rate_percent,
        input.term_years,
    );
    let schedule = generate_schedule(&loan, None)?;
    let horizon_months = input.horizon_years * 12;

    let principal_by_year = yearly_totals(&monthly_field(&schedule, horizon_months, |p| p.principal_applied));
    let interest_by_year = yearly_totals(&monthly_field(&schedule, horizon_months, |p| p.interest_accrued));
    let pmi_by_year = yearly_totals(&pmi_stream(input, &loan, &schedule, horizon_months));
    if pmi_by_year.iter().any(|p| !p.is_zero()) {
        warnings.push("Down payment under 20%; PMI included until LTV reaches 78%".into());
    }

    let mut years = Vec::with_capacity(input.horizon_years as usize);
    for year in 1..=input.horizon_years {
        let i = year as usize - 1;
        let value = grow(input.home_price, input.home_appreciation_percent, year - 1)?;
        let mut row = TcoYear {
            year,
            principal: principal_by_year[i],
            interest: interest_by_year[i],
            property_tax: value * percent_to_rate(input.property_tax_rate_percent),
            insurance: input.annual_insurance,
            hoa: input.monthly_hoa * dec!(12),
            maintenance: value * percent_to_rate(input.maintenance_rate_percent),
            pmi: pmi_by_year[i],
            total: Decimal::ZERO,
        };
        row.total = row.principal + row.interest + row.property_tax + row.insurance + row.hoa + row.maintenance + row.pmi;
        years.push(row);
    }

    let totals = years.iter().fold(TcoYear::default(), |acc, y| TcoYear {
        year: input.horizon_years,
        principal: acc.principal + y.principal,
        interest: acc.interest + y.interest,
        property_tax: acc.property_tax + y.property_tax,
        insurance: acc.insurance + y.insurance,
        hoa: acc.hoa + y.hoa,
        maintenance: acc.maintenance + y.maintenance,
        pmi: acc.pmi + y.pmi,
        total: acc.total + y.total,
    });

    let closing_costs = input.home_price * percent_to_rate(input.closing_cost_percent);
    let upfront_cash = input.down_payment + closing_costs;
    let total_outflow = upfront_cash + totals.total;

    let home_value_at_horizon = grow(input.home_price, input.home_appreciation_percent, input.horizon_years)?;
    let loan_balance_at_horizon = schedule.balance_after(horizon_months);
    let equity_at_horizon = home_value_at_horizon
        - loan_balance_at_horizon
        - home_value_at_horizon * percent_to_rate(input.selling_cost_percent);
    let net_cost = total_outflow - equity_at_horizon;

    let mut flows = Vec::with_capacity(years.len() + 1);
    flows.push(upfront_cash);
    flows.extend(years.iter().map(|y| y.total));
    let npv_of_outflows = npv(percent_to_rate(input.discount_rate_percent), &flows)?;

    let output = TcoOutput {
        monthly_principal_and_interest: schedule.monthly_payment,
        upfront_cash,
        years,
        totals,
        total_outflow,
        home_value_at_horizon,
        loan_balance_at_horizon,
        equity_at_horizon,
        net_cost,
        effective_monthly_cost: net_cost / Decimal::from(horizon_months),
        npv_of_outflows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Total cost of ownership: P&I, tax, insurance, HOA, maintenance, PMI less equity recovered on sale",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "home_appreciation_percent": input.home_appreciation_percent.to_string(),
            "discount_rate_percent": input.discount_rate_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn monthly_field<F>(schedule: &AmortizationSchedule, horizon_months: u32, field: F) -> Vec<Money>
where
    F: Fn(&crate::amortization::PeriodResult) -> Money,
{
    (1..=horizon_months)
        .map(|m| {
            schedule
                .periods
                .get(m as usize - 1)
                .map(&field)
                .unwrap_or(Decimal::ZERO)
        })
        .collect()
}

/// Monthly PMI charged while the opening balance is above 78% of the price,
/// never past the midpoint of the term.
fn pmi_stream(input: &TcoInput, loan: &LoanTerms, schedule: &AmortizationSchedule, horizon_months: u32) -> Vec<Money> {
    let monthly_pmi = loan.principal * percent_to_rate(input.pmi_annual_rate_percent) / dec!(12);
    let required = loan.principal / input.home_price > PMI_REQUIRED_LTV;
    let midpoint = loan.term_months() / 2;
    (1..=horizon_months)
        .map(|m| {
            let ltv = schedule.balance_after(m - 1) / input.home_price;
            if required && m <= midpoint && ltv > PMI_CANCEL_LTV {
                monthly_pmi
            } else {
                Decimal::ZERO
            }
        })
        .collect()
}

fn validate_input(input: &TcoInput) -> MortgageCalcResult<()> {
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
    validate_horizon(input.horizon_years)?;
    for (field, value) in [
        ("closing_cost_percent", input.closing_cost_percent),
        ("property_tax_rate_percent", input.property_tax_rate_percent),
        ("annual_insurance", input.annual_insurance),
        ("monthly_hoa", input.monthly_hoa),
        ("maintenance_rate_percent", input.maintenance_rate_percent),
        ("pmi_annual_rate_percent", input.pmi_annual_rate_percent),
        ("selling_cost_percent", input.selling_cost_percent),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> TcoInput {
        TcoInput {
            home_price: dec!(350000),
            down_payment: dec!(70000),
            annual_rate_percent: dec!(6),
            term_years: 30,
            horizon_years: 10,
            closing_cost_percent: dec!(3),
            property_tax_rate_percent: dec!(1),
            annual_insurance: dec!(1200),
            monthly_hoa: dec!(50),
            maintenance_rate_percent: dec!(1),
            pmi_annual_rate_percent: dec!(0.5),
            home_appreciation_percent: Decimal::ZERO,
            selling_cost_percent: dec!(6),
            discount_rate_percent: Decimal::ZERO,
        }
    }

    #[test]
    fn test_no_pmi_with_twenty_percent_down() {
        let out = calculate_tco(&sample_input()).unwrap();
        assert_eq!(out.result.totals.pmi, Decimal::ZERO);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_breakdown_sums() {
        let out = calculate_tco(&sample_input()).unwrap().result;
        assert_eq!(out.years.len(), 10);
        let y1 = &out.years[0];
        assert_eq!(y1.property_tax, dec!(3500));
        assert_eq!(y1.hoa, dec!(600));
        let pi = y1.principal + y1.interest - out.monthly_principal_and_interest * dec!(12);
        assert!(pi.abs() < dec!(0.000001));
        // Zero discount rate: NPV is the plain sum of outflows
        assert_eq!(out.npv_of_outflows, out.total_outflow);
        assert_eq!(out.upfront_cash, dec!(80500));
    }

    #[test]
    fn test_equity_and_net_cost() {
        let out = calculate_tco(&sample_input()).unwrap().result;
        assert_eq!(out.home_value_at_horizon, dec!(350000));
        assert_eq!(
            out.equity_at_horizon,
            dec!(350000) - out.loan_balance_at_horizon - dec!(21000)
        );
        assert_eq!(out.net_cost, out.total_outflow - out.equity_at_horizon);
    }

    #[test]
    fn test_pmi_charged_on_low_down_payment() {
        let mut input = sample_input();
        input.down_payment = dec!(17500);
        let out = calculate_tco(&input).unwrap();
        let pmi = out.result.totals.pmi;
        // 332,500 * 0.5% / 12 = 138.54 a month; LTV stays above 78% for the whole horizon
        assert!((pmi - dec!(16625)).abs() < dec!(0.01), "got {pmi}");
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_discounting_lowers_npv() {
        let mut input = sample_input();
        input.discount_rate_percent = dec!(4);
        let out = calculate_tco(&input).unwrap().result;
        assert!(out.npv_of_outflows < out.total_outflow);
    }
}
