use clap::Args;
use feasibility_core::amortization::AmortizationCache;
use feasibility_core::{finance, improvement};
use serde_json::Value;

use super::AnalysisRequest;
use crate::input;

#[derive(Args)]
pub struct ImproveArgs {
    /// JSON or YAML request file; reads piped stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_improve(args: ImproveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AnalysisRequest = input::load(args.input.as_deref())?;
    let brand = request.brand.resolve()?;
    let base = finance::calculate(
        &brand,
        &request.site,
        &request.market,
        request.target_daily_sales,
    )?;
    let mut cache = AmortizationCache::new();
    let scenarios = improvement::simulate(
        &brand,
        &request.site,
        &request.market,
        &request.roadview,
        request.target_daily_sales,
        &base,
        &mut cache,
    )?;
    Ok(serde_json::to_value(&scenarios)?)
}
