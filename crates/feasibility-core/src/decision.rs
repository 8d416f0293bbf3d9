use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, AmortizationCache};
use crate::brand::{BrandProfile, ResolvedBrandProfile, validate_site};
use crate::exit_plan::{self, ExitPlan};
use crate::finance::{self, FinanceResult};
use crate::improvement::{self, ImprovementScenario};
use crate::risk::{self, RiskCard};
use crate::scoring::{self, HardCutReason, ScoreOutcome};
use crate::survival::{self, SurvivalEstimate};
use crate::{EngineError, EngineResult, types::*};

/// A structural failure mode with an estimated window before it bites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureTrigger {
    pub code: String,
    pub description: String,
    pub window_months: u32,
}

/// The go/no-go verdict. `non_negotiable` forbids downstream narrative
/// layers from softening the signal; it must survive consumers unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalJudgement {
    pub signal: Signal,
    pub label: String,
    pub non_negotiable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_reason: Option<HardCutReason>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// How much to trust the verdict, from input completeness and signal
/// stability under the ±10% volume scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionConfidence {
    pub data_coverage: ConfidenceLevel,
    pub assumption_risk: ConfidenceLevel,
    pub judgement_stability: ConfidenceLevel,
}

/// The full engine output: everything downstream renderers, narrative
/// generators, and persistence consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResult {
    pub finance: FinanceResult,
    pub score: ScoreOutcome,
    pub signal: Signal,
    pub survival: SurvivalEstimate,
    pub risk_cards: Vec<RiskCard>,
    /// Legacy projection of `risk_cards`, same list as narrative strings.
    pub risk_factors: Vec<String>,
    pub hard_cut_reasons: Vec<HardCutReason>,
    pub failure_triggers: Vec<FailureTrigger>,
    pub exit_plan: ExitPlan,
    pub improvements: Vec<ImprovementScenario>,
    pub final_judgement: FinalJudgement,
    pub confidence: DecisionConfidence,
}

/// The orchestrator. Construct once with an explicit config; `analyze` is
/// pure and deterministic per call.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full feasibility analysis for one site/brand/target triple.
    pub fn analyze(
        &self,
        brand: &BrandProfile,
        site: &SiteConditions,
        market: &MarketSnapshot,
        roadview: &RoadviewAssessment,
        target_daily_sales: Decimal,
    ) -> EngineResult<ComputationOutput<DecisionResult>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let resolved = brand.resolve()?;
        validate_site(site)?;
        amortization::validate_loans(&site.loans)?;

        let mut cache = AmortizationCache::new();
        let amort = cache.get_or_compute(&site.loans)?;
        let finance = finance::calculate_with_amortization(
            &resolved,
            site,
            market,
            target_daily_sales,
            &amort,
        )?;

        if finance.expected.gap_warning {
            warnings.push(
                "No independent demand signal was available; GAP is forced to zero and the target stands in for expected demand."
                    .to_string(),
            );
        }

        let score = scoring::calculate_score(&finance, market, roadview);
        let signal = scoring::determine_signal(score.score, &finance);
        let hard_cut_reasons = scoring::hard_cuts(&finance);
        let survival = survival::estimate(&finance, market, roadview);
        let risk_cards = risk::generate(&finance, survival.months);
        let risk_factors = risk::risk_factors(&risk_cards);
        let exit_plan = exit_plan::build(
            &resolved,
            site,
            &finance,
            self.config.exit_horizon_months,
        );
        let improvements = improvement::simulate(
            &resolved,
            site,
            market,
            roadview,
            target_daily_sales,
            &finance,
            &mut cache,
        )?;

        let failure_triggers = failure_triggers(&finance, &survival);
        let final_judgement = final_judgement(signal, &hard_cut_reasons);
        let confidence = confidence(
            &resolved,
            site,
            market,
            &finance,
            signal,
            &improvements,
        );

        let result = DecisionResult {
            finance,
            score,
            signal,
            survival,
            risk_cards,
            risk_factors,
            hard_cut_reasons,
            failure_triggers,
            exit_plan,
            improvements,
            final_judgement,
            confidence,
        };

        enforce_self_check(
            self.config.strict_validation,
            self_check(&result),
            &mut warnings,
        )?;

        let assumptions = serde_json::json!({
            "exit_profit_held_constant": true,
            "days_per_month": 30,
            "exit_curve": resolved.curve_key,
            "exit_horizon_months": self.config.exit_horizon_months,
        });

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Franchise-cafe feasibility decision model",
            &assumptions,
            warnings,
            elapsed,
            result,
        ))
    }
}

fn failure_triggers(finance: &FinanceResult, survival: &SurvivalEstimate) -> Vec<FailureTrigger> {
    let mut triggers = Vec::new();

    if finance.sensitivity.minus10.monthly_profit <= Decimal::ZERO {
        triggers.push(FailureTrigger {
            code: "sales_dip_loss".into(),
            description: "A 10% shortfall against the sales target turns the site loss-making."
                .into(),
            window_months: 3,
        });
    }
    if survival.months < dec!(36) {
        triggers.push(FailureTrigger {
            code: "short_survival".into(),
            description: format!(
                "Estimated operating survival is {:.0} months, inside the 36-month baseline.",
                survival.months
            ),
            window_months: survival.months.trunc().to_u32().unwrap_or(12),
        });
    }
    if finance.fixed_cost_share() >= dec!(0.30) {
        triggers.push(FailureTrigger {
            code: "fixed_cost_pressure".into(),
            description: "Rent and fixed overheads absorb enough revenue that a slow quarter compounds quickly."
                .into(),
            window_months: 6,
        });
    }
    match finance.payback_months {
        Some(p) if p < dec!(36) => {}
        _ => {
            triggers.push(FailureTrigger {
                code: "payback_over_horizon".into(),
                description: "The investment is not recovered within a 36-month contract horizon."
                    .into(),
                window_months: 36,
            });
        }
    }
    if matches!(finance.debt.dscr, Some(d) if d < Decimal::ONE) {
        triggers.push(FailureTrigger {
            code: "debt_service_shortfall".into(),
            description: "Operating profit cannot cover the monthly debt payment.".into(),
            window_months: 2,
        });
    }

    triggers
}

fn final_judgement(signal: Signal, hard_cuts: &[HardCutReason]) -> FinalJudgement {
    let primary_reason = hard_cuts.first().copied();
    let non_negotiable = signal == Signal::Red || !hard_cuts.is_empty();

    let label = match signal {
        Signal::Green => "GO",
        Signal::Yellow => "CONDITIONAL GO",
        Signal::Red => "NO-GO",
    };

    let summary = match primary_reason {
        Some(HardCutReason::DscrBelowOne) => {
            "Debt service exceeds operating profit; the financing structure fails regardless of sales execution.".to_string()
        }
        Some(HardCutReason::BrandDeclineHigh) => {
            "The brand is shedding revenue too fast for any single site to compensate.".to_string()
        }
        Some(HardCutReason::PaybackTooLong) => {
            "The investment cannot be recovered within an acceptable horizon at this volume.".to_string()
        }
        Some(HardCutReason::NegativeProfit) => {
            "The site loses money every month at the target volume.".to_string()
        }
        None => match signal {
            Signal::Green => "The model supports proceeding at the stated conditions.".to_string(),
            Signal::Yellow => {
                "Viable only if the flagged conditions are renegotiated or de-risked first."
                    .to_string()
            }
            Signal::Red => "The weighted score falls below the viability floor.".to_string(),
        },
    };

    FinalJudgement {
        signal,
        label: label.to_string(),
        non_negotiable,
        primary_reason,
        summary,
    }
}

fn confidence(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    market: &MarketSnapshot,
    finance: &FinanceResult,
    signal: Signal,
    improvements: &[ImprovementScenario],
) -> DecisionConfidence {
    let data_coverage = if finance.expected.gap_warning {
        ConfidenceLevel::Low
    } else if market.expected_daily_sales.is_none() || brand.avg_monthly_sales.is_none() {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    };

    let decline = brand.decline_rate_3yr.unwrap_or(Decimal::ZERO);
    let assumption_risk = if finance.expected.gap_warning || decline >= dec!(0.20) {
        ConfidenceLevel::High
    } else if decline >= dec!(0.10) || !site.loans.is_empty() {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    let scenario_signal = |id: &str| {
        improvements
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.signal)
    };
    let diverging = [scenario_signal("volume_down_10"), scenario_signal("volume_up_10")]
        .iter()
        .filter(|s| matches!(s, Some(sig) if *sig != signal))
        .count();
    let judgement_stability = match diverging {
        0 => ConfidenceLevel::High,
        1 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    };

    DecisionConfidence {
        data_coverage,
        assumption_risk,
        judgement_stability,
    }
}

/// Development-time self-check of the output contract. Deviations mean an
/// engine bug, not bad user input.
fn self_check(result: &DecisionResult) -> Vec<String> {
    let mut deviations = Vec::new();

    let f = &result.finance;
    if (f.monthly_profit <= Decimal::ZERO) != f.payback_months.is_none() {
        deviations.push("monthlyProfit <= 0 must hold exactly when paybackMonths is null".into());
    }
    for case in [&f.sensitivity.plus10, &f.sensitivity.minus10] {
        if (case.monthly_profit <= Decimal::ZERO) != case.payback_months.is_none() {
            deviations.push("sensitivity case violates the payback nullability rule".into());
        }
    }

    if result.score.success_probability != result.score.score / dec!(100) {
        deviations.push("successProbability must equal score/100".into());
    }
    let b = &result.score.breakdown;
    for (name, value) in [
        ("payback", b.payback),
        ("profitability", b.profitability),
        ("gap", b.gap),
        ("sensitivity", b.sensitivity),
        ("fixedCost", b.fixed_cost),
        ("dscr", b.dscr),
        ("market", b.market),
        ("roadview", b.roadview),
    ] {
        if value < Decimal::ZERO || value > dec!(100) {
            deviations.push(format!("sub-score {name} out of the 0–100 band"));
        }
    }

    let plan = &result.exit_plan;
    if let Some(optimal) = plan
        .months
        .iter()
        .find(|m| m.month == plan.optimal_exit_month)
    {
        if plan.months.iter().any(|m| m.total_loss < optimal.total_loss) {
            deviations.push("optimalExitMonth does not index the series minimum".into());
        }
    } else {
        deviations.push("optimalExitMonth outside the generated series".into());
    }
    if let Some(trap) = plan.trap_zone_start_month {
        if trap < plan.optimal_exit_month {
            deviations.push("trapZoneStartMonth precedes optimalExitMonth".into());
        }
    }

    let expected_non_negotiable =
        result.signal == Signal::Red || !result.hard_cut_reasons.is_empty();
    if result.final_judgement.non_negotiable != expected_non_negotiable {
        deviations.push("nonNegotiable must reflect red signal or hard cuts".into());
    }

    deviations
}

/// Apply the strictness policy to self-check deviations: strict mode fails
/// hard with a `SchemaViolation`, lenient mode logs each deviation and
/// carries it as an envelope warning.
fn enforce_self_check(
    strict: bool,
    deviations: Vec<String>,
    warnings: &mut Vec<String>,
) -> EngineResult<()> {
    if deviations.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(EngineError::SchemaViolation {
            check: deviations.join("; "),
        });
    }
    for deviation in &deviations {
        tracing::warn!(deviation = %deviation, "output schema self-check deviation");
        warnings.push(format!("schema self-check: {deviation}"));
    }
    Ok(())
}
