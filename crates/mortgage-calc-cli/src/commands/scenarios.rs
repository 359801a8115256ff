use clap::Args;
use serde_json::Value;

use mortgage_calc_core::scenarios::life_events::{self, LifeEventsInput};
use mortgage_calc_core::scenarios::rent_simulator::{self, RentSimInput};
use mortgage_calc_core::scenarios::stress_test::{self, EquityPathsInput, StressTestInput};
use mortgage_calc_core::scenarios::what_if::{self, WhatIfInput};

use crate::input;

#[derive(Args)]
pub struct WhatIfArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct LifeEventsArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct StressTestArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct EquityPathsArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// RNG seed for reproducible paths (overrides the input file)
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct RentSimArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_what_if(args: WhatIfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wi_input: WhatIfInput = input::load(args.input.as_deref(), "what-if simulation")?;
    let result = what_if::simulate_what_if(&wi_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_life_events(args: LifeEventsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let le_input: LifeEventsInput = input::load(args.input.as_deref(), "life events simulation")?;
    let result = life_events::simulate_life_events(&le_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stress_test(args: StressTestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let st_input: StressTestInput = input::load(args.input.as_deref(), "stress test")?;
    let result = stress_test::run_stress_test(&st_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_equity_paths(args: EquityPathsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut ep_input: EquityPathsInput = input::load(args.input.as_deref(), "equity path simulation")?;
    if args.seed.is_some() {
        ep_input.seed = args.seed;
    }
    let result = stress_test::simulate_equity_paths(&ep_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rent_sim(args: RentSimArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rs_input: RentSimInput = input::load(args.input.as_deref(), "rent simulation")?;
    let result = rent_simulator::simulate_rent(&rs_input)?;
    Ok(serde_json::to_value(result)?)
}
