use clap::Args;
use feasibility_core::amortization;
use feasibility_core::Loan;
use serde::Deserialize;
use serde_json::Value;

use crate::input;

#[derive(Args)]
pub struct AmortizeArgs {
    /// JSON or YAML file holding `{ "loans": [...] }`; reads stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AmortizeRequest {
    loans: Vec<Loan>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AmortizeRequest = input::load(args.input.as_deref())?;
    let result = amortization::amortize(&request.loans)?;
    Ok(serde_json::to_value(&result)?)
}
