use clap::Args;
use feasibility_core::decision::DecisionEngine;
use feasibility_core::EngineConfig;
use serde_json::Value;

use super::AnalysisRequest;
use crate::input;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// JSON or YAML request file; reads piped stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Exit-plan horizon in months
    #[arg(long, default_value_t = 36)]
    pub horizon: u32,
}

pub fn run_analyze(args: AnalyzeArgs, lenient: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AnalysisRequest = input::load(args.input.as_deref())?;
    let config = EngineConfig {
        strict_validation: !lenient,
        exit_horizon_months: args.horizon,
    };
    let output = DecisionEngine::new(config).analyze(
        &request.brand,
        &request.site,
        &request.market,
        &request.roadview,
        request.target_daily_sales,
    )?;
    Ok(serde_json::to_value(&output)?)
}
