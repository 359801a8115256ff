use mortgage_calc_core::amortization::{
    amortize, breakeven_period, crossover_period, generate_schedule, yearly_totals, AmortizationInput,
    Amortizer, Breakeven, ExtraPaymentPolicy, LoanTerms, NoExtra, ScheduleStatus,
};
use mortgage_calc_core::time_value::grow;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loans() -> Vec<LoanTerms> {
    vec![
        LoanTerms::new(dec!(300000), dec!(6.5), 30),
        LoanTerms::new(dec!(150000), dec!(3.25), 15),
        LoanTerms::new(dec!(825000), dec!(7.875), 30),
        LoanTerms::new(dec!(45000), dec!(11.9), 7),
        LoanTerms::new(dec!(1000000), dec!(5), 50),
        LoanTerms::new(dec!(1), dec!(0.01), 1),
    ]
}

// ===========================================================================
// Known answers
// ===========================================================================

#[test]
fn test_thirty_year_reference_loan() {
    let schedule = generate_schedule(&LoanTerms::new(dec!(300000), dec!(6.5), 30), None).unwrap();
    assert!(
        (schedule.monthly_payment - dec!(1896.20)).abs() < dec!(0.01),
        "Expected payment ~1896.20, got {}",
        schedule.monthly_payment
    );
    assert!(
        (schedule.total_interest() - dec!(382632)).abs() < dec!(5),
        "Expected interest ~382,632, got {}",
        schedule.total_interest()
    );
    assert_eq!(schedule.status, ScheduleStatus::PaidOff { month: 360 });
}

#[test]
fn test_zero_rate_fifteen_year() {
    let schedule = generate_schedule(&LoanTerms::new(dec!(200000), Decimal::ZERO, 15), None).unwrap();
    assert_eq!(schedule.monthly_payment, dec!(200000) / dec!(180));
    assert_eq!(schedule.total_interest(), Decimal::ZERO);
    assert_eq!(schedule.payoff_month(), 180);
}

#[test]
fn test_engine_entry_point_with_start_date() {
    let input: AmortizationInput = serde_json::from_str(
        r#"{
            "principal": "300000",
            "annual_rate_percent": "6.5",
            "term_years": 30,
            "start_date": "2024-01-01",
            "extra_payments": { "extra_monthly": "200" }
        }"#,
    )
    .unwrap();
    let out = amortize(&input).unwrap();
    let savings = out.result.extra_payment_savings.unwrap();
    assert!(savings.interest_saved > dec!(90000));
    assert!(savings.months_saved > 70);
    assert!(out.result.payoff_date.unwrap() < chrono::NaiveDate::from_ymd_opt(2048, 1, 1).unwrap());
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

// ===========================================================================
// Properties across a spread of loans
// ===========================================================================

#[test]
fn test_standard_schedules_pay_off_within_term() {
    for terms in loans() {
        let schedule = generate_schedule(&terms, None).unwrap();
        let last = schedule.periods.last().unwrap();
        assert_eq!(last.ending_balance, Decimal::ZERO, "{terms:?}");
        assert!(schedule.payoff_month() <= terms.term_months(), "{terms:?}");
        assert!(!schedule.negative_amortization, "{terms:?}");
    }
}

#[test]
fn test_schedule_generation_is_idempotent() {
    let policy = ExtraPaymentPolicy {
        extra_monthly: dec!(75),
        lump_sum: dec!(5000),
        lump_sum_at_month: 18,
    };
    for terms in loans() {
        let first = generate_schedule(&terms, Some(&policy)).unwrap();
        let second = generate_schedule(&terms, Some(&policy)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_balance_never_increases() {
    for terms in loans() {
        let schedule = generate_schedule(&terms, Some(&ExtraPaymentPolicy::monthly(dec!(50)))).unwrap();
        for pair in schedule.periods.windows(2) {
            assert!(pair[1].ending_balance <= pair[0].ending_balance);
        }
        assert!(schedule.periods.iter().all(|p| p.ending_balance >= Decimal::ZERO));
    }
}

#[test]
fn test_extra_payments_never_cost_more() {
    let policies = [
        ExtraPaymentPolicy::monthly(dec!(1)),
        ExtraPaymentPolicy::monthly(dec!(500)),
        ExtraPaymentPolicy::lump_sum(dec!(10000), 1),
        ExtraPaymentPolicy::lump_sum(dec!(10000), 200),
    ];
    for terms in loans() {
        let baseline = generate_schedule(&terms, None).unwrap();
        for policy in &policies {
            let with_extra = generate_schedule(&terms, Some(policy)).unwrap();
            assert!(with_extra.total_interest() <= baseline.total_interest());
            assert!(with_extra.payoff_month() <= baseline.payoff_month());
        }
    }
}

#[test]
fn test_oversized_lump_sum_stops_at_payoff() {
    let terms = LoanTerms::new(dec!(100000), dec!(6), 30);
    let schedule = generate_schedule(&terms, Some(&ExtraPaymentPolicy::lump_sum(dec!(500000), 3))).unwrap();
    assert_eq!(schedule.periods.len(), 3);
    assert_eq!(schedule.status, ScheduleStatus::PaidOff { month: 3 });
    // Principal applied is capped at the balance
    assert!((schedule.total_principal() - dec!(100000)).abs() < dec!(0.000000001));
}

#[test]
fn test_interest_only_payment_exhausts_term_with_flag() {
    // 1% monthly on 100k is 1000 of interest; a 900 payment never catches up
    let schedule = Amortizer::with_payment(dec!(100000), dec!(0.01), dec!(900), 24, NoExtra)
        .unwrap()
        .run()
        .unwrap();
    assert!(schedule.negative_amortization);
    assert_eq!(schedule.periods.len(), 24);
    match schedule.status {
        ScheduleStatus::TermExhausted { remaining_balance } => assert!(remaining_balance > dec!(100000)),
        other => panic!("expected TermExhausted, got {other:?}"),
    }
}

#[test]
fn test_invalid_terms_rejected() {
    assert!(generate_schedule(&LoanTerms::new(Decimal::ZERO, dec!(5), 30), None).is_err());
    assert!(generate_schedule(&LoanTerms::new(dec!(100000), dec!(-1), 30), None).is_err());
    assert!(generate_schedule(&LoanTerms::new(dec!(100000), dec!(5), 0), None).is_err());
    assert!(generate_schedule(&LoanTerms::new(dec!(100000), dec!(5), 51), None).is_err());
}

// ===========================================================================
// Breakeven and crossover
// ===========================================================================

#[test]
fn test_rent_crossover_reference() {
    // Own at 1000/mo flat, rent at 800/mo growing 5%/yr
    let own: Vec<Decimal> = vec![dec!(12000); 10];
    let rent: Vec<Decimal> = (0..10).map(|y| grow(dec!(9600), dec!(5), y).unwrap()).collect();
    assert_eq!(breakeven_period(&rent, &own), Breakeven::At(10));
    assert_eq!(breakeven_period(&rent[..8], &own[..8]), Breakeven::Never);

    let flat_rent: Vec<Decimal> = vec![dec!(9600); 10];
    assert_eq!(breakeven_period(&flat_rent, &own), Breakeven::Never);
}

#[test]
fn test_crossover_of_monthly_streams() {
    let rising: Vec<Decimal> = (1..=36).map(|m| Decimal::from(m) * dec!(10)).collect();
    let flat = vec![dec!(200); 36];
    assert_eq!(crossover_period(&rising, &flat), Breakeven::At(20));
    assert_eq!(yearly_totals(&flat), vec![dec!(2400); 3]);
}
