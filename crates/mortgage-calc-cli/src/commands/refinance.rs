use clap::Args;
use serde_json::Value;

use mortgage_calc_core::refinance::buydown::{self, BuydownInput};
use mortgage_calc_core::refinance::heloc_vs_refi::{self, HelocVsRefiInput};
use mortgage_calc_core::refinance::points::{self, PointsInput};
use mortgage_calc_core::refinance::refi_breakeven::{self, RefinanceInput};

use crate::input;

#[derive(Args)]
pub struct RefinanceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct PointsArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct HelocVsRefiArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct BuydownArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refi_input: RefinanceInput = input::load(args.input.as_deref(), "refinance breakeven")?;
    let result = refi_breakeven::analyze_refinance(&refi_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_points(args: PointsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let points_input: PointsInput = input::load(args.input.as_deref(), "discount points")?;
    let result = points::analyze_points(&points_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_heloc_vs_refi(args: HelocVsRefiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let hvr_input: HelocVsRefiInput = input::load(args.input.as_deref(), "HELOC vs refinance")?;
    let result = heloc_vs_refi::compare_heloc_vs_refi(&hvr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_buydown(args: BuydownArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let buydown_input: BuydownInput = input::load(args.input.as_deref(), "buydown analysis")?;
    let result = buydown::analyze_buydown(&buydown_input)?;
    Ok(serde_json::to_value(result)?)
}
