use clap::Args;
use feasibility_core::{exit_plan, finance};
use serde_json::Value;

use super::FinanceRequest;
use crate::input;

#[derive(Args)]
pub struct ExitPlanArgs {
    /// JSON or YAML request file; reads piped stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Horizon in months
    #[arg(long, default_value_t = 36)]
    pub horizon: u32,
}

pub fn run_exit_plan(args: ExitPlanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FinanceRequest = input::load(args.input.as_deref())?;
    let brand = request.brand.resolve()?;
    let result = finance::calculate(
        &brand,
        &request.site,
        &request.market,
        request.target_daily_sales,
    )?;
    let plan = exit_plan::build(&brand, &request.site, &result, args.horizon);
    Ok(serde_json::to_value(&plan)?)
}
