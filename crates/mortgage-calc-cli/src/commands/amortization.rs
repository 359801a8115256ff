use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use mortgage_calc_core::amortization::{self, AmortizationInput};

use crate::input;

/// Arguments for a full amortization run
#[derive(Args)]
pub struct AmortizeArgs {
    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (6.5 for 6.5%)
    #[arg(long, alias = "rate")]
    pub annual_rate_percent: Option<Decimal>,

    /// Loan term in years
    #[arg(long, alias = "term", default_value = "30")]
    pub term_years: u32,

    /// Extra principal added to every payment
    #[arg(long)]
    pub extra_monthly: Option<Decimal>,

    /// One-time principal prepayment
    #[arg(long)]
    pub lump_sum: Option<Decimal>,

    /// Month (1-based) the lump sum is paid
    #[arg(long, default_value = "1")]
    pub lump_sum_month: u32,

    /// First payment date (YYYY-MM-DD), enables the payoff date
    #[arg(long)]
    pub start_date: Option<String>,

    /// Home value at origination, enables the equity series
    #[arg(long)]
    pub home_value: Option<Decimal>,

    /// Annual home appreciation in percent
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Include every monthly period in the output
    #[arg(long)]
    pub schedule: bool,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = args
            .annual_rate_percent
            .ok_or("--annual-rate-percent is required (or provide --input)")?;
        let extra_payments = if args.extra_monthly.is_some() || args.lump_sum.is_some() {
            Some(serde_json::json!({
                "extra_monthly": args.extra_monthly.unwrap_or(Decimal::ZERO).to_string(),
                "lump_sum": args.lump_sum.unwrap_or(Decimal::ZERO).to_string(),
                "lump_sum_at_month": args.lump_sum_month,
            }))
        } else {
            None
        };
        serde_json::from_value(serde_json::json!({
            "principal": principal.to_string(),
            "annual_rate_percent": rate.to_string(),
            "term_years": args.term_years,
            "extra_payments": extra_payments,
            "start_date": args.start_date,
            "home_value": args.home_value.map(|v| v.to_string()),
            "home_appreciation_percent": args.appreciation.unwrap_or(dec!(0)).to_string(),
            "include_schedule": args.schedule,
        }))?
    };

    let result = amortization::amortize(&amort_input)?;
    Ok(serde_json::to_value(result)?)
}
