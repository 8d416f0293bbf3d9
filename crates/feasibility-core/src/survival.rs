use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::finance::FinanceResult;
use crate::types::*;

/// Structural baseline: a funded franchise cafe is assumed able to operate
/// three years before the model starts docking months.
pub const BASELINE_MONTHS: Decimal = dec!(36);
/// The estimate never drops below one year of runway.
pub const FLOOR_MONTHS: Decimal = dec!(12);

/// One applied penalty or bonus, for the report trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalAdjustment {
    pub label: String,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalEstimate {
    pub months: Decimal,
    pub baseline: Decimal,
    pub adjustments: Vec<SurvivalAdjustment>,
    /// Threshold warnings, tightest first.
    pub warnings: Vec<String>,
}

/// Estimate operating survival as a 36-month baseline minus risk-weighted
/// penalties, floored at 12 months.
pub fn estimate(
    finance: &FinanceResult,
    market: &MarketSnapshot,
    roadview: &RoadviewAssessment,
) -> SurvivalEstimate {
    let mut adjustments = Vec::new();
    let push = |adjustments: &mut Vec<SurvivalAdjustment>, label: &str, delta: Decimal| {
        adjustments.push(SurvivalAdjustment {
            label: label.to_string(),
            delta,
        });
    };

    match finance.payback_months {
        Some(p) if p > dec!(36) => {
            push(&mut adjustments, "payback beyond 36 months", dec!(-1.5) * (p - dec!(36)));
        }
        Some(p) if p > dec!(24) => {
            push(&mut adjustments, "payback beyond 24 months", dec!(-0.5) * (p - dec!(24)));
        }
        Some(p) if p < dec!(18) => {
            push(&mut adjustments, "fast payback", dec!(6));
        }
        Some(_) => {}
        None => {
            push(&mut adjustments, "no payback at current volume", dec!(-20));
        }
    }

    let minus10 = &finance.sensitivity.minus10;
    if minus10.monthly_profit <= Decimal::ZERO {
        push(&mut adjustments, "loss-making under a 10% sales dip", dec!(-15));
    } else if finance.monthly_profit > Decimal::ZERO
        && minus10.monthly_profit < finance.monthly_profit * dec!(0.5)
    {
        push(&mut adjustments, "profit halves under a 10% sales dip", dec!(-8));
    }

    let fixed_share = finance.fixed_cost_share();
    if fixed_share > dec!(0.35) {
        push(&mut adjustments, "fixed costs above 35% of revenue", dec!(-10));
    } else if fixed_share > dec!(0.30) {
        push(&mut adjustments, "fixed costs above 30% of revenue", dec!(-5));
    }

    let margin = finance.profit_margin();
    if margin < dec!(0.10) {
        push(&mut adjustments, "net margin below 10%", dec!(-5));
    } else if margin < dec!(0.15) {
        push(&mut adjustments, "net margin below 15%", dec!(-2));
    }

    if market.market_score < dec!(50) {
        push(&mut adjustments, "weak market score", dec!(-3));
    }
    if roadview.risk_score < dec!(50) {
        push(&mut adjustments, "weak roadview score", dec!(-2));
    }

    if let Some(dscr) = finance.debt.dscr {
        if dscr < Decimal::ONE {
            push(&mut adjustments, "DSCR below 1.0", dec!(-12));
        } else if dscr < dec!(1.2) {
            push(&mut adjustments, "DSCR below 1.2", dec!(-6));
        } else if dscr < dec!(1.5) {
            push(&mut adjustments, "DSCR below 1.5", dec!(-3));
        }
    }

    let raw: Decimal = BASELINE_MONTHS + adjustments.iter().map(|a| a.delta).sum::<Decimal>();
    let months = raw.max(FLOOR_MONTHS);

    SurvivalEstimate {
        months,
        baseline: BASELINE_MONTHS,
        adjustments,
        warnings: threshold_warnings(months),
    }
}

/// Fixed threshold warning sentences at ≤12, ≤24, ≤36 months.
pub fn threshold_warnings(months: Decimal) -> Vec<String> {
    let mut warnings = Vec::new();
    if months <= dec!(12) {
        warnings.push(
            "Estimated survival is a year or less; the site is unlikely to outlast its first lease term.".to_string(),
        );
    }
    if months <= dec!(24) {
        warnings.push(
            "Estimated survival is under two years; recovery of the initial investment is at serious risk.".to_string(),
        );
    }
    if months <= dec!(36) {
        warnings.push(
            "Estimated survival is under three years; structural weaknesses shorten the expected operating life.".to_string(),
        );
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::BrandProfile;
    use crate::finance;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn fixture(target: Decimal, loans: Vec<Loan>) -> FinanceResult {
        let brand = BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let site = SiteConditions {
            initial_investment: dec!(200_000_000),
            monthly_rent: dec!(4_000_000),
            area_size: dec!(60),
            owner_working: true,
            loans,
            key_money: None,
            demolition_base_cost: None,
            demolition_per_area_cost: None,
        };
        let market = MarketSnapshot {
            expected_daily_sales: Some(dec!(290)),
            market_score: dec!(75),
        };
        finance::calculate(&brand, &site, &market, target).unwrap()
    }

    fn market(score: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            expected_daily_sales: Some(dec!(290)),
            market_score: score,
        }
    }

    fn roadview(score: Decimal) -> RoadviewAssessment {
        RoadviewAssessment {
            risk_score: score,
            overall_risk: None,
        }
    }

    #[test]
    fn healthy_site_keeps_most_of_the_baseline() {
        let f = fixture(dec!(300), vec![]);
        let estimate = estimate(&f, &market(dec!(75)), &roadview(dec!(80)));
        assert!(estimate.months > dec!(30), "months = {}", estimate.months);
    }

    #[test]
    fn loss_making_site_hits_the_floor() {
        let f = fixture(dec!(50), vec![]);
        let estimate = estimate(&f, &market(dec!(40)), &roadview(dec!(40)));
        assert_eq!(estimate.months, FLOOR_MONTHS);
        // -20 payback, -15 dip, fixed-cost and margin penalties all apply
        assert!(estimate.adjustments.len() >= 4);
    }

    #[test]
    fn floor_emits_all_three_threshold_warnings() {
        let warnings = threshold_warnings(dec!(12));
        assert_eq!(warnings.len(), 3);
        let warnings = threshold_warnings(dec!(30));
        assert_eq!(warnings.len(), 1);
        let warnings = threshold_warnings(dec!(40));
        assert!(warnings.is_empty());
    }

    #[test]
    fn slow_payback_penalty_scales_with_overshoot() {
        // Larger investment stretches payback past 36 months
        let brand = BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let site = SiteConditions {
            initial_investment: dec!(400_000_000),
            monthly_rent: dec!(4_000_000),
            area_size: dec!(60),
            owner_working: true,
            loans: vec![],
            key_money: None,
            demolition_base_cost: None,
            demolition_per_area_cost: None,
        };
        let f = finance::calculate(&brand, &site, &market(dec!(75)), dec!(300)).unwrap();
        let p = f.payback_months.unwrap();
        assert!(p > dec!(36));
        let estimate = estimate(&f, &market(dec!(75)), &roadview(dec!(80)));
        let payback_penalty = estimate
            .adjustments
            .iter()
            .find(|a| a.label.contains("payback"))
            .unwrap();
        assert_eq!(payback_penalty.delta, dec!(-1.5) * (p - dec!(36)));
    }

    #[test]
    fn debt_pressure_shortens_survival() {
        let loans = vec![Loan {
            principal: dec!(150_000_000),
            annual_rate: dec!(0.06),
            term_months: 60,
            repayment_style: RepaymentStyle::EqualPayment,
        }];
        let unlevered = estimate(&fixture(dec!(300), vec![]), &market(dec!(75)), &roadview(dec!(80)));
        let levered = estimate(&fixture(dec!(300), loans), &market(dec!(75)), &roadview(dec!(80)));
        assert!(levered.months <= unlevered.months);
    }
}
