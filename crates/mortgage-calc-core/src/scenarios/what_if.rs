use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::series::{balance_series, ChartSeries};
use crate::amortization::{generate_schedule, AmortizationSchedule, ExtraPaymentPolicy, LoanTerms};
use crate::error::MortgageCalcError;
use crate::types::*;
use crate::MortgageCalcResult;

fn default_lump_sum_month() -> u32 {
    1
}

/// One modification of the base loan. Unset fields keep the base terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfScenario {
    pub name: String,
    #[serde(default)]
    pub extra_monthly: Money,
    #[serde(default)]
    pub lump_sum: Money,
    #[serde(default = "default_lump_sum_month")]
    pub lump_sum_month: u32,
    #[serde(default)]
    pub rate_percent: Option<Percent>,
    #[serde(default)]
    pub term_years: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfInput {
    #[serde(flatten)]
    pub loan: LoanTerms,
    pub scenarios: Vec<WhatIfScenario>,
    /// Attach a balance series per scenario for charting
    #[serde(default)]
    pub include_series: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfOutcome {
    pub name: String,
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub payoff_month: u32,
    /// Positive when the scenario pays less interest than the base loan
    pub interest_saved: Money,
    /// Positive when the scenario pays off sooner
    pub months_saved: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_series: Option<ChartSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfOutput {
    pub baseline: WhatIfOutcome,
    pub scenarios: Vec<WhatIfOutcome>,
    /// Scenario with the largest interest saving
    pub best_scenario: Option<String>,
}

/// Run every scenario against a single baseline schedule of the base loan.
pub fn simulate_what_if(input: &WhatIfInput) -> MortgageCalcResult<ComputationOutput<WhatIfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.loan.validate()?;
    if input.scenarios.is_empty() {
        return Err(MortgageCalcError::InsufficientData(
            "At least one scenario is required".into(),
        ));
    }

    let base_schedule = generate_schedule(&input.loan, None)?;
    let baseline = outcome("baseline", &base_schedule, &base_schedule, input.include_series);

    let mut scenarios = Vec::with_capacity(input.scenarios.len());
    for scenario in &input.scenarios {
        let terms = LoanTerms {
            principal: input.loan.principal,
            annual_rate_percent: scenario.rate_percent.unwrap_or(input.loan.annual_rate_percent),
            term_years: scenario.term_years.unwrap_or(input.loan.term_years),
        };
        let policy = ExtraPaymentPolicy {
            extra_monthly: scenario.extra_monthly,
            lump_sum: scenario.lump_sum,
            lump_sum_at_month: scenario.lump_sum_month,
        };
        let schedule = generate_schedule(&terms, Some(&policy))?;
        let result = outcome(&scenario.name, &schedule, &base_schedule, input.include_series);
        if result.interest_saved < Decimal::ZERO {
            warnings.push(format!(
                "Scenario '{}' pays {:.2} more interest than the base loan",
                scenario.name, -result.interest_saved
            ));
        }
        scenarios.push(result);
    }

    let best_scenario = scenarios
        .iter()
        .filter(|s| s.interest_saved > Decimal::ZERO)
        .max_by(|a, b| a.interest_saved.cmp(&b.interest_saved))
        .map(|s| s.name.clone());

    let output = WhatIfOutput {
        baseline,
        scenarios,
        best_scenario,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "What-if: each scenario simulated month by month against one baseline schedule",
        &serde_json::json!({
            "principal": input.loan.principal.to_string(),
            "annual_rate_percent": input.loan.annual_rate_percent.to_string(),
            "term_years": input.loan.term_years,
            "scenario_count": input.scenarios.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn outcome(
    name: &str,
    schedule: &AmortizationSchedule,
    baseline: &AmortizationSchedule,
    include_series: bool,
) -> WhatIfOutcome {
    WhatIfOutcome {
        name: name.to_string(),
        monthly_payment: schedule.monthly_payment,
        total_interest: schedule.total_interest(),
        total_paid: schedule.total_paid(),
        payoff_month: schedule.payoff_month(),
        interest_saved: baseline.total_interest() - schedule.total_interest(),
        months_saved: i64::from(baseline.payoff_month()) - i64::from(schedule.payoff_month()),
        balance_series: include_series.then(|| balance_series(schedule)),
    }
}
