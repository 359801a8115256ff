use clap::Args;
use serde_json::Value;

use mortgage_calc_core::comparison::arm_vs_fixed::{self, ArmVsFixedInput};
use mortgage_calc_core::comparison::buy_vs_keep::{self, BuyVsKeepInput};
use mortgage_calc_core::comparison::rent_vs_buy::{self, RentVsBuyInput};
use mortgage_calc_core::comparison::tco::{self, TcoInput};

use crate::input;

#[derive(Args)]
pub struct RentVsBuyArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct ArmVsFixedArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct TcoArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct BuyVsKeepArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rent_vs_buy(args: RentVsBuyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rvb_input: RentVsBuyInput = input::load(args.input.as_deref(), "rent vs buy")?;
    let result = rent_vs_buy::compare_rent_vs_buy(&rvb_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_arm_vs_fixed(args: ArmVsFixedArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let arm_input: ArmVsFixedInput = input::load(args.input.as_deref(), "ARM vs fixed")?;
    let result = arm_vs_fixed::compare_arm_vs_fixed(&arm_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tco(args: TcoArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tco_input: TcoInput = input::load(args.input.as_deref(), "total cost of ownership")?;
    let result = tco::calculate_tco(&tco_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_buy_vs_keep(args: BuyVsKeepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bvk_input: BuyVsKeepInput = input::load(args.input.as_deref(), "buy vs keep")?;
    let result = buy_vs_keep::compare_buy_vs_keep(&bvk_input)?;
    Ok(serde_json::to_value(result)?)
}
