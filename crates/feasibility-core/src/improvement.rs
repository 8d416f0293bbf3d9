use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::AmortizationCache;
use crate::brand::ResolvedBrandProfile;
use crate::finance::{self, FinanceResult};
use crate::scoring;
use crate::survival;
use crate::{EngineResult, types::*};

const RENT_CUT: Decimal = dec!(0.9);
const VOLUME_DOWN: Decimal = dec!(0.9);
const VOLUME_UP: Decimal = dec!(1.10);
const LOAN_PRINCIPAL_CUT: Decimal = dec!(0.8);
const LOAN_RATE_CUT: Decimal = dec!(0.01);

/// Outcome of one perturbation scenario. Purely differential; nothing is
/// retained between scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementScenario {
    pub id: String,
    pub label: String,
    pub survival_months: Decimal,
    pub signal: Signal,
    pub score: Score,
    pub monthly_profit: Money,
}

/// Re-run the finance model, scoring, and survival estimate under fixed
/// perturbations and report the resulting outcomes per scenario.
pub fn simulate(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    market: &MarketSnapshot,
    roadview: &RoadviewAssessment,
    target_daily_sales: Decimal,
    base: &FinanceResult,
    cache: &mut AmortizationCache,
) -> EngineResult<Vec<ImprovementScenario>> {
    let mut scenarios = Vec::new();

    {
        let mut cheaper = site.clone();
        cheaper.monthly_rent = site.monthly_rent * RENT_CUT;
        scenarios.push(run(
            "rent_cut_10",
            "Negotiate rent down 10%",
            brand,
            &cheaper,
            market,
            roadview,
            target_daily_sales,
            cache,
        )?);
    }

    scenarios.push(run(
        "volume_down_10",
        "Sales land 10% below target",
        brand,
        site,
        market,
        roadview,
        target_daily_sales * VOLUME_DOWN,
        cache,
    )?);

    scenarios.push(run(
        "volume_up_10",
        "Sales land 10% above target",
        brand,
        site,
        market,
        roadview,
        target_daily_sales * VOLUME_UP,
        cache,
    )?);

    if !site.loans.is_empty() {
        let mut restructured = site.clone();
        restructured.loans = site
            .loans
            .iter()
            .map(|loan| Loan {
                principal: loan.principal * LOAN_PRINCIPAL_CUT,
                annual_rate: (loan.annual_rate - LOAN_RATE_CUT).max(Decimal::ZERO),
                ..loan.clone()
            })
            .collect();
        scenarios.push(run(
            "loan_restructure",
            "Refinance: 20% less principal, 1pp lower rate",
            brand,
            &restructured,
            market,
            roadview,
            target_daily_sales,
            cache,
        )?);
    }

    // When the decline-adjusted expectation sits below the target, show
    // what committing to the realistic volume would look like.
    if let Some(adjusted) = base.expected.adjusted_expected_daily_sales {
        if adjusted < target_daily_sales && adjusted > Decimal::ZERO {
            scenarios.push(run(
                "demand_reset",
                "Reset target to the decline-adjusted expected volume",
                brand,
                site,
                market,
                roadview,
                adjusted,
                cache,
            )?);
        }
    }

    Ok(scenarios)
}

#[allow(clippy::too_many_arguments)]
fn run(
    id: &str,
    label: &str,
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    market: &MarketSnapshot,
    roadview: &RoadviewAssessment,
    target_daily_sales: Decimal,
    cache: &mut AmortizationCache,
) -> EngineResult<ImprovementScenario> {
    let amort = cache.get_or_compute(&site.loans)?;
    let finance =
        finance::calculate_with_amortization(brand, site, market, target_daily_sales, &amort)?;
    let outcome = scoring::calculate_score(&finance, market, roadview);
    let signal = scoring::determine_signal(outcome.score, &finance);
    let estimate = survival::estimate(&finance, market, roadview);
    Ok(ImprovementScenario {
        id: id.to_string(),
        label: label.to_string(),
        survival_months: estimate.months,
        signal,
        score: outcome.score,
        monthly_profit: finance.monthly_profit,
    })
}
