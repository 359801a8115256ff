use mortgage_calc_core::affordability::{dti, pmi};
use mortgage_calc_core::amortization::{monthly_payment, Breakeven, LoanTerms};
use mortgage_calc_core::comparison::{arm_vs_fixed, rent_vs_buy, tco};
use mortgage_calc_core::refinance::{buydown, points, refi_breakeven};
use mortgage_calc_core::MortgageCalcError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_payment() -> Decimal {
    monthly_payment(&LoanTerms::new(dec!(300000), dec!(6.5), 30)).unwrap()
}

// ===========================================================================
// Affordability
// ===========================================================================

#[test]
fn test_dti_from_json_uses_default_limits() {
    let input: dti::DtiInput = serde_json::from_str(
        r#"{
            "gross_monthly_income": "9000",
            "loan": { "principal": "300000", "annual_rate_percent": "6.5", "term_years": 30 },
            "monthly_property_tax": "350",
            "monthly_insurance": "120",
            "other_debts": [
                { "name": "auto", "monthly_payment": "450" },
                { "name": "student", "monthly_payment": "300" }
            ]
        }"#,
    )
    .unwrap();
    let out = dti::calculate_dti(&input).unwrap().result;
    assert_eq!(out.principal_and_interest, reference_payment());
    assert_eq!(out.total_other_debt, dec!(750));
    // (1896.20 + 470) / 9000 = 26.3%
    assert_eq!(out.front_end_status, dti::DtiStatus::WithinGuideline);
    // (2366.20 + 750) / 9000 = 34.6%
    assert_eq!(out.back_end_status, dti::DtiStatus::WithinGuideline);
    assert!(out.max_loan_amount.is_some());
}

#[test]
fn test_pmi_not_required_with_twenty_percent_down() {
    let input: pmi::PmiInput = serde_json::from_str(
        r#"{
            "loan": { "principal": "320000", "annual_rate_percent": "6.5", "term_years": 30 },
            "home_value": "400000",
            "pmi_annual_rate_percent": "0.5"
        }"#,
    )
    .unwrap();
    let out = pmi::analyze_pmi_removal(&input).unwrap().result;
    assert!(!out.pmi_required);
    assert_eq!(out.total_pmi_until_termination, Decimal::ZERO);
}

// ===========================================================================
// Comparisons
// ===========================================================================

#[test]
fn test_tco_payment_matches_engine() {
    let input: tco::TcoInput = serde_json::from_str(
        r#"{
            "home_price": "375000",
            "down_payment": "75000",
            "annual_rate_percent": "6.5",
            "term_years": 30
        }"#,
    )
    .unwrap();
    let out = tco::calculate_tco(&input).unwrap().result;
    assert_eq!(out.monthly_principal_and_interest, reference_payment());
    assert_eq!(out.years.len(), 10);
    assert!(out.equity_at_horizon > dec!(75000));
}

#[test]
fn test_rent_vs_buy_long_stay_favors_buying() {
    let input: rent_vs_buy::RentVsBuyInput = serde_json::from_str(
        r#"{
            "home_price": "400000",
            "down_payment": "80000",
            "annual_rate_percent": "6",
            "term_years": 30,
            "monthly_rent": "2400",
            "horizon_years": 30
        }"#,
    )
    .unwrap();
    let out = rent_vs_buy::compare_rent_vs_buy(&input).unwrap().result;
    assert_eq!(out.years.len(), 30);
    assert!(out.breakeven_year.period().is_some());
}

#[test]
fn test_arm_with_flat_index_at_teaser_level_never_loses() {
    let input = arm_vs_fixed::ArmVsFixedInput {
        principal: dec!(400000),
        term_years: 30,
        fixed_rate_percent: dec!(7),
        arm_initial_rate_percent: dec!(5.75),
        initial_period_years: 5,
        adjustment_interval_months: 12,
        margin_percent: dec!(2.75),
        expected_index_percent: dec!(3),
        index_path: vec![],
        initial_adjustment_cap_percent: dec!(2),
        periodic_cap_percent: dec!(2),
        lifetime_cap_percent: dec!(5),
        floor_percent: None,
        horizon_years: Some(7),
    };
    let out = arm_vs_fixed::compare_arm_vs_fixed(&input).unwrap().result;
    // Index + margin equals the teaser rate, so the ARM never resets upward
    assert!(out.expected.resets.iter().all(|r| r.rate_percent == dec!(5.75)));
    assert_eq!(out.expected.breakeven_month, Breakeven::Never);
    assert!(out.horizon_advantage_of_arm > Decimal::ZERO);
    assert!(out.worst_case.max_rate_percent <= dec!(10.75));
}

// ===========================================================================
// Refinance
// ===========================================================================

#[test]
fn test_refinance_json_defaults_to_paying_costs() {
    let input: refi_breakeven::RefinanceInput = serde_json::from_str(
        r#"{
            "current_balance": "280000",
            "current_rate_percent": "7.25",
            "current_remaining_months": 324,
            "new_rate_percent": "6",
            "new_term_years": 30,
            "closing_costs": "5500"
        }"#,
    )
    .unwrap();
    assert!(!input.roll_costs_into_loan);
    let out = refi_breakeven::analyze_refinance(&input).unwrap();
    assert_eq!(out.result.upfront_cost, dec!(5500));
    assert!(out.result.simple_breakeven_month.period().is_some());
    // 360-month refinance of a 324-month loan
    assert!(out.warnings.iter().any(|w| w.contains("extends repayment")));
}

#[test]
fn test_points_and_buydown_price_the_same_rate_drop_differently() {
    let loan = LoanTerms::new(dec!(400000), dec!(7), 30);
    let permanent = points::analyze_points(&points::PointsInput {
        loan: loan.clone(),
        points: dec!(4),
        rate_reduction_per_point_percent: dec!(0.25),
        discounted_rate_percent: None,
        horizon_years: None,
    })
    .unwrap()
    .result;
    let temporary = buydown::analyze_buydown(&buydown::BuydownInput {
        loan,
        buydown: buydown::BuydownType::OneZero,
    })
    .unwrap()
    .result;
    // Same 1-point reduction: year-one payments agree
    assert!((permanent.discounted_payment - temporary.years[0].monthly_payment).abs() < dec!(0.000001));
    assert!(temporary.total_subsidy < permanent.points_cost);
}

#[test]
fn test_errors_name_the_offending_field() {
    let input = points::PointsInput {
        loan: LoanTerms::new(dec!(400000), dec!(7), 30),
        points: dec!(-1),
        rate_reduction_per_point_percent: dec!(0.25),
        discounted_rate_percent: None,
        horizon_years: None,
    };
    match points::analyze_points(&input) {
        Err(MortgageCalcError::InvalidInput { field, .. }) => assert_eq!(field, "points"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[cfg(feature = "scenarios")]
mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;
    use mortgage_calc_core::scenarios::{life_events, rent_simulator, what_if};

    #[test]
    fn test_what_if_and_life_events_agree_on_windfall() {
        let loan = LoanTerms::new(dec!(300000), dec!(6.5), 30);
        let what_if = what_if::simulate_what_if(&what_if::WhatIfInput {
            loan: loan.clone(),
            scenarios: vec![what_if::WhatIfScenario {
                name: "bonus".into(),
                extra_monthly: Decimal::ZERO,
                lump_sum: dec!(25000),
                lump_sum_month: 36,
                rate_percent: None,
                term_years: None,
            }],
            include_series: false,
        })
        .unwrap()
        .result;
        let events = life_events::simulate_life_events(&life_events::LifeEventsInput {
            loan,
            events: vec![life_events::LifeEvent {
                month: 36,
                kind: life_events::LifeEventKind::Windfall {
                    amount: dec!(25000),
                    recast: false,
                },
            }],
            include_schedule: false,
        })
        .unwrap()
        .result;
        assert_eq!(what_if.scenarios[0].payoff_month, events.payoff_month);
        assert_eq!(what_if.scenarios[0].total_interest, events.total_interest);
        assert_eq!(what_if.baseline.total_interest, events.baseline_total_interest);
    }

    #[test]
    fn test_rent_simulator_from_json() {
        let input: rent_simulator::RentSimInput = serde_json::from_str(
            r#"{ "monthly_rent": "800", "rent_growth_percent": "5", "monthly_ownership_cost": "1000" }"#,
        )
        .unwrap();
        let out = rent_simulator::simulate_rent(&input).unwrap().result;
        assert_eq!(out.cumulative_crossover_year, Breakeven::At(10));
    }
}
