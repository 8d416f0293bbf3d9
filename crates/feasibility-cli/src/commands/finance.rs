use clap::Args;
use feasibility_core::finance;
use serde_json::Value;

use super::FinanceRequest;
use crate::input;

#[derive(Args)]
pub struct FinanceArgs {
    /// JSON or YAML request file; reads piped stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_finance(args: FinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FinanceRequest = input::load(args.input.as_deref())?;
    let brand = request.brand.resolve()?;
    let result = finance::calculate(
        &brand,
        &request.site,
        &request.market,
        request.target_daily_sales,
    )?;
    Ok(serde_json::to_value(&result)?)
}
