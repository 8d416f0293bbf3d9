use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::finance::FinanceResult;
use crate::types::*;

/// Monthly profit below this is treated as thin even when positive.
const PROFIT_COMFORT_FLOOR: Decimal = dec!(5_000_000);

/// Weight of the engine's own score vs the market score in the blend.
const ENGINE_WEIGHT: Decimal = dec!(0.7);
const MARKET_WEIGHT: Decimal = dec!(0.3);
/// Share of the roadview shortfall subtracted after blending.
const ROADVIEW_WEIGHT: Decimal = dec!(0.2);

/// A rule that forces the verdict regardless of the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardCutReason {
    DscrBelowOne,
    BrandDeclineHigh,
    PaybackTooLong,
    NegativeProfit,
}

impl HardCutReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DscrBelowOne => "DSCR_BELOW_ONE",
            Self::BrandDeclineHigh => "BRAND_DECLINE_HIGH",
            Self::PaybackTooLong => "PAYBACK_TOO_LONG",
            Self::NegativeProfit => "NEGATIVE_PROFIT",
        }
    }
}

/// Eight named sub-scores, each clamped to 0–100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub payback: Score,
    pub profitability: Score,
    pub gap: Score,
    pub sensitivity: Score,
    pub fixed_cost: Score,
    pub dscr: Score,
    pub market: Score,
    pub roadview: Score,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub score: Score,
    pub success_probability: Decimal,
    pub breakdown: ScoreBreakdown,
    /// Human-readable account of every deduction applied.
    pub rationale: Vec<String>,
}

/// Compute the weighted 0–100 viability score.
///
/// Two paths run independently: the fine per-factor breakdown, and a
/// coarse deduction path starting from 100 with deductions tied to the
/// same thresholds. The coarse score is then blended with the market
/// score, reduced by the roadview shortfall, and takes additional debt
/// and brand-decline deductions.
pub fn calculate_score(
    finance: &FinanceResult,
    market: &MarketSnapshot,
    roadview: &RoadviewAssessment,
) -> ScoreOutcome {
    let breakdown = score_breakdown(finance, market, roadview);
    let mut rationale = Vec::new();

    let mut score = dec!(100);

    match finance.payback_months {
        None => {
            score -= dec!(30);
            rationale.push("No payback: monthly profit is non-positive (-30)".into());
        }
        Some(p) if p > dec!(36) => {
            score -= dec!(30);
            rationale.push(format!("Payback {p:.1} months exceeds 36 (-30)"));
        }
        Some(p) if p > dec!(24) => {
            score -= dec!(15);
            rationale.push(format!("Payback {p:.1} months exceeds 24 (-15)"));
        }
        Some(_) => {}
    }

    if finance.monthly_profit <= Decimal::ZERO {
        score -= dec!(40);
        rationale.push("Monthly profit is non-positive (-40)".into());
    } else if finance.monthly_profit < PROFIT_COMFORT_FLOOR {
        score -= dec!(15);
        rationale.push("Monthly profit below comfort floor (-15)".into());
    }

    let gap = finance.expected.gap_pct_vs_target;
    if gap > dec!(0.25) {
        score -= dec!(25);
        rationale.push(format!("Target overshoots expected demand by {gap:.2} (-25)"));
    } else if gap > dec!(0.15) {
        score -= dec!(15);
        rationale.push(format!("Target overshoots expected demand by {gap:.2} (-15)"));
    } else if gap > dec!(0.10) {
        score -= dec!(8);
        rationale.push(format!("Target overshoots expected demand by {gap:.2} (-8)"));
    }

    let minus10 = &finance.sensitivity.minus10;
    if minus10.monthly_profit <= Decimal::ZERO {
        score -= dec!(20);
        rationale.push("A 10% sales dip turns the site loss-making (-20)".into());
    } else if finance.monthly_profit > Decimal::ZERO
        && minus10.monthly_profit < finance.monthly_profit * dec!(0.5)
    {
        score -= dec!(10);
        rationale.push("A 10% sales dip halves monthly profit (-10)".into());
    }

    let fixed_share = finance.fixed_cost_share();
    if fixed_share > dec!(0.35) {
        score -= dec!(15);
        rationale.push(format!("Fixed costs take {fixed_share:.2} of revenue (-15)"));
    } else if fixed_share > dec!(0.30) {
        score -= dec!(8);
        rationale.push(format!("Fixed costs take {fixed_share:.2} of revenue (-8)"));
    }

    // Blend with the market score, then subtract the roadview shortfall.
    let market_score = clamp_score(market.market_score);
    let roadview_score = clamp_score(roadview.risk_score);
    score = score * ENGINE_WEIGHT + market_score * MARKET_WEIGHT;
    score -= (dec!(100) - roadview_score) * ROADVIEW_WEIGHT;

    if let Some(dscr) = finance.debt.dscr {
        if dscr < Decimal::ONE {
            score -= dec!(30);
            rationale.push(format!("DSCR {dscr:.2} below 1.0 (-30)"));
        } else if dscr < dec!(1.2) {
            score -= dec!(12);
            rationale.push(format!("DSCR {dscr:.2} below 1.2 (-12)"));
        }
    }

    if let Some(decline) = finance.expected.brand_decline_rate {
        if decline >= dec!(0.30) {
            score -= dec!(25);
            rationale.push(format!("Brand revenue decline {decline:.2} over 3y (-25)"));
        } else if decline >= dec!(0.20) {
            score -= dec!(15);
            rationale.push(format!("Brand revenue decline {decline:.2} over 3y (-15)"));
        } else if decline >= dec!(0.10) {
            score -= dec!(8);
            rationale.push(format!("Brand revenue decline {decline:.2} over 3y (-8)"));
        }
    }

    let score = clamp_score(score);
    ScoreOutcome {
        score,
        success_probability: score / dec!(100),
        breakdown,
        rationale,
    }
}

fn score_breakdown(
    finance: &FinanceResult,
    market: &MarketSnapshot,
    roadview: &RoadviewAssessment,
) -> ScoreBreakdown {
    let payback = match finance.payback_months {
        None => dec!(0),
        Some(p) if p > dec!(36) => dec!(50),
        Some(p) if p > dec!(24) => dec!(70),
        Some(p) if p >= dec!(18) => dec!(85),
        Some(_) => dec!(100),
    };

    let profitability = if finance.monthly_profit <= Decimal::ZERO {
        dec!(0)
    } else if finance.monthly_profit < PROFIT_COMFORT_FLOOR {
        dec!(60)
    } else {
        dec!(100)
    };

    let gap_pct = finance.expected.gap_pct_vs_target;
    let gap = if gap_pct > dec!(0.25) {
        dec!(50)
    } else if gap_pct > dec!(0.15) {
        dec!(70)
    } else if gap_pct > dec!(0.10) {
        dec!(85)
    } else {
        dec!(100)
    };

    let minus10 = &finance.sensitivity.minus10;
    let sensitivity = if minus10.monthly_profit <= Decimal::ZERO {
        dec!(30)
    } else if finance.monthly_profit > Decimal::ZERO
        && minus10.monthly_profit < finance.monthly_profit * dec!(0.5)
    {
        dec!(60)
    } else {
        dec!(100)
    };

    let fixed_share = finance.fixed_cost_share();
    let fixed_cost = if fixed_share > dec!(0.35) {
        dec!(50)
    } else if fixed_share > dec!(0.30) {
        dec!(70)
    } else {
        dec!(100)
    };

    let dscr = match finance.debt.dscr {
        None => dec!(100),
        Some(d) if d < Decimal::ONE => dec!(0),
        Some(d) if d < dec!(1.2) => dec!(50),
        Some(d) if d < dec!(1.5) => dec!(80),
        Some(_) => dec!(100),
    };

    ScoreBreakdown {
        payback,
        profitability,
        gap,
        sensitivity,
        fixed_cost,
        dscr,
        market: clamp_score(market.market_score),
        roadview: clamp_score(roadview.risk_score),
    }
}

/// Every hard-cut rule the finance result violates, in evaluation order.
pub fn hard_cuts(finance: &FinanceResult) -> Vec<HardCutReason> {
    let mut reasons = Vec::new();
    if matches!(finance.debt.dscr, Some(d) if d < Decimal::ONE) {
        reasons.push(HardCutReason::DscrBelowOne);
    }
    if matches!(finance.expected.brand_decline_rate, Some(d) if d >= dec!(0.30)) {
        reasons.push(HardCutReason::BrandDeclineHigh);
    }
    match finance.payback_months {
        None => reasons.push(HardCutReason::PaybackTooLong),
        Some(p) if p >= dec!(36) => reasons.push(HardCutReason::PaybackTooLong),
        Some(_) => {}
    }
    if finance.monthly_profit <= Decimal::ZERO {
        reasons.push(HardCutReason::NegativeProfit);
    }
    reasons
}

/// Derive the traffic-light verdict. Hard cuts force red outright;
/// structural caution flags force yellow even above the green threshold;
/// only then does the continuous score decide.
pub fn determine_signal(score: Score, finance: &FinanceResult) -> Signal {
    if !hard_cuts(finance).is_empty() {
        return Signal::Red;
    }

    let caution = matches!(finance.expected.brand_decline_rate, Some(d) if d >= dec!(0.20))
        || finance.expected.gap_pct_vs_target >= dec!(0.15)
        || finance.sensitivity.minus10.monthly_profit <= Decimal::ZERO
        || finance.fixed_cost_share() >= dec!(0.35);
    if caution {
        return Signal::Yellow;
    }

    if score >= dec!(70) {
        Signal::Green
    } else if score >= dec!(50) {
        Signal::Yellow
    } else {
        Signal::Red
    }
}
