use clap::Args;
use serde_json::Value;

use mortgage_calc_core::affordability::dti::{self, DtiInput};
use mortgage_calc_core::affordability::pmi::{self, PmiInput};

use crate::input;

#[derive(Args)]
pub struct DtiArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct PmiArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_dti(args: DtiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dti_input: DtiInput = input::load(args.input.as_deref(), "DTI analysis")?;
    let result = dti::calculate_dti(&dti_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pmi(args: PmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pmi_input: PmiInput = input::load(args.input.as_deref(), "PMI removal analysis")?;
    let result = pmi::analyze_pmi_removal(&pmi_input)?;
    Ok(serde_json::to_value(result)?)
}
