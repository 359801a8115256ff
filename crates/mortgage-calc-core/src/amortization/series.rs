use serde::{Deserialize, Serialize};

use super::aggregation::cumulative;
use super::schedule::AmortizationSchedule;
use crate::types::Money;

/// A labelled point series handed to an external charting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: u32,
    pub value: Money,
}

impl ChartSeries {
    /// Series over 1-based periods.
    pub fn from_values(label: &str, values: &[Money]) -> Self {
        ChartSeries {
            label: label.to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    period: i as u32 + 1,
                    value: *v,
                })
                .collect(),
        }
    }

    pub fn values(&self) -> Vec<Money> {
        self.points.iter().map(|p| p.value).collect()
    }
}

pub fn balance_series(schedule: &AmortizationSchedule) -> ChartSeries {
    let balances: Vec<Money> = schedule.periods.iter().map(|p| p.ending_balance).collect();
    ChartSeries::from_values("Remaining balance", &balances)
}

pub fn cumulative_interest_series(schedule: &AmortizationSchedule) -> ChartSeries {
    let interest: Vec<Money> = schedule.periods.iter().map(|p| p.interest_accrued).collect();
    ChartSeries::from_values("Cumulative interest", &cumulative(&interest))
}

pub fn cumulative_principal_series(schedule: &AmortizationSchedule) -> ChartSeries {
    let principal: Vec<Money> = schedule.periods.iter().map(|p| p.principal_applied).collect();
    ChartSeries::from_values("Cumulative principal", &cumulative(&principal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::{generate_schedule, LoanTerms};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_series_track_schedule() {
        let sched = generate_schedule(&LoanTerms::new(dec!(1200), Decimal::ZERO, 1), None).unwrap();
        let balance = balance_series(&sched);
        assert_eq!(balance.points.len(), 12);
        assert_eq!(balance.points[0].period, 1);
        assert_eq!(balance.points[0].value, dec!(1100));

        let principal = cumulative_principal_series(&sched);
        assert_eq!(principal.points.last().unwrap().value, dec!(1200));

        let interest = cumulative_interest_series(&sched);
        assert!(interest.values().iter().all(|v| v.is_zero()));
    }
}
