pub mod amortize;
pub mod analyze;
pub mod exit_plan;
pub mod finance;
pub mod improve;

use feasibility_core::brand::BrandProfile;
use feasibility_core::{MarketSnapshot, RoadviewAssessment, SiteConditions};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Full analysis request: everything the decision orchestrator needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub brand: BrandProfile,
    pub site: SiteConditions,
    pub market: MarketSnapshot,
    pub roadview: RoadviewAssessment,
    pub target_daily_sales: Decimal,
}

/// Finance-only request; no roadview needed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRequest {
    pub brand: BrandProfile,
    pub site: SiteConditions,
    pub market: MarketSnapshot,
    pub target_daily_sales: Decimal,
}
