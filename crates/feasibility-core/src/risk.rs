use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::finance::FinanceResult;
use crate::types::*;

/// A structured risk finding. Cards are additive across rule families and
/// never deduplicated; both the structured projection and the legacy
/// string-narrative projection derive from this one list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCard {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub evidence: serde_json::Value,
    pub narrative: String,
}

/// Legacy projection: the narrative strings alone.
pub fn risk_factors(cards: &[RiskCard]) -> Vec<String> {
    cards.iter().map(|c| c.narrative.clone()).collect()
}

/// Fire every applicable risk card against the finance output and the
/// survival estimate.
pub fn generate(finance: &FinanceResult, survival_months: Decimal) -> Vec<RiskCard> {
    let mut cards = Vec::new();

    rent_burden(finance, &mut cards);
    payback_length(finance, &mut cards);
    demand_gap(finance, &mut cards);
    thin_margin(finance, &mut cards);
    debt_stress(finance, &mut cards);
    brand_decline(finance, &mut cards);
    survival_threshold(survival_months, &mut cards);

    cards
}

fn rent_burden(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    let share = finance.rent_share();
    if share <= dec!(0.15) {
        return;
    }
    let severity = if share > dec!(0.20) {
        Severity::High
    } else {
        Severity::Medium
    };
    cards.push(RiskCard {
        id: "rent_burden".into(),
        title: "Rent burden".into(),
        severity,
        evidence: json!({
            "rentShare": share,
            "monthlyRent": finance.monthly_costs.rent,
            "monthlyRevenue": finance.monthly_revenue,
        }),
        narrative: format!(
            "Rent consumes {:.1}% of revenue; above 15% a single slow season strains cash.",
            share * dec!(100)
        ),
    });
}

fn payback_length(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    match finance.payback_months {
        None => {
            cards.push(RiskCard {
                id: "negative_profit".into(),
                title: "Loss-making at target volume".into(),
                severity: Severity::High,
                evidence: json!({
                    "monthlyProfit": finance.monthly_profit,
                    "breakEvenDailySales": finance.break_even_daily_sales,
                }),
                narrative:
                    "The site loses money every month at the target volume; the investment is never recovered."
                        .into(),
            });
        }
        Some(p) if p > dec!(30) => {
            let severity = if p >= dec!(36) {
                Severity::High
            } else {
                Severity::Medium
            };
            cards.push(RiskCard {
                id: "payback_long".into(),
                title: "Slow investment recovery".into(),
                severity,
                evidence: json!({ "paybackMonths": p }),
                narrative: format!(
                    "Recovering the investment takes {p:.0} months, longer than a typical first franchise contract."
                ),
            });
        }
        Some(_) => {}
    }
}

fn demand_gap(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    let gap = finance.expected.gap_pct_vs_target;
    if gap <= dec!(0.15) {
        return;
    }
    let severity = if gap > dec!(0.25) {
        Severity::High
    } else {
        Severity::Medium
    };
    cards.push(RiskCard {
        id: "demand_gap".into(),
        title: "Target exceeds expected demand".into(),
        severity,
        evidence: json!({
            "gapPctVsTarget": gap,
            "expectedDailySales": finance.expected.expected_daily_sales,
            "gapWarning": finance.expected.gap_warning,
        }),
        narrative: format!(
            "The sales target sits {:.0}% above what demand data supports.",
            gap * dec!(100)
        ),
    });
}

fn thin_margin(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    let margin = finance.profit_margin();
    if finance.monthly_profit <= Decimal::ZERO || margin >= dec!(0.10) {
        return;
    }
    let severity = if margin < dec!(0.05) {
        Severity::High
    } else {
        Severity::Medium
    };
    cards.push(RiskCard {
        id: "thin_margin".into(),
        title: "Thin profit margin".into(),
        severity,
        evidence: json!({
            "profitMargin": margin,
            "monthlyProfit": finance.monthly_profit,
        }),
        narrative: format!(
            "Net margin is {:.1}%; small cost shocks erase the profit entirely.",
            margin * dec!(100)
        ),
    });
}

fn debt_stress(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    let Some(dscr) = finance.debt.dscr else {
        return;
    };
    if dscr >= dec!(1.2) {
        return;
    }
    let severity = if dscr < Decimal::ONE {
        Severity::High
    } else {
        Severity::Medium
    };
    cards.push(RiskCard {
        id: "dscr_stress".into(),
        title: "Debt service stress".into(),
        severity,
        evidence: json!({
            "dscr": dscr,
            "monthlyDebtPayment": finance.debt.payment,
            "operatingProfit": finance.operating_profit,
        }),
        narrative: if dscr < Decimal::ONE {
            "Operating profit does not cover the monthly debt payment.".into()
        } else {
            format!("DSCR of {dscr:.2} leaves almost no buffer over the debt payment.")
        },
    });
}

fn brand_decline(finance: &FinanceResult, cards: &mut Vec<RiskCard>) {
    let Some(decline) = finance.expected.brand_decline_rate else {
        return;
    };
    if decline < dec!(0.10) {
        return;
    }
    let severity = if decline >= dec!(0.30) {
        Severity::High
    } else if decline >= dec!(0.20) {
        Severity::Medium
    } else {
        Severity::Low
    };
    cards.push(RiskCard {
        id: "brand_decline".into(),
        title: "Brand in decline".into(),
        severity,
        evidence: json!({
            "declineRate3yr": decline,
            "revenueAdjustmentFactor": finance.expected.revenue_adjustment_factor,
        }),
        narrative: format!(
            "Brand stores lost {:.0}% of revenue over three years; expected demand was marked down accordingly.",
            decline * dec!(100)
        ),
    });
}

fn survival_threshold(survival_months: Decimal, cards: &mut Vec<RiskCard>) {
    let (severity, narrative) = if survival_months <= dec!(12) {
        (
            Severity::High,
            "Estimated survival is a year or less; the site is unlikely to outlast its first lease term.",
        )
    } else if survival_months <= dec!(24) {
        (
            Severity::Medium,
            "Estimated survival is under two years; recovery of the initial investment is at serious risk.",
        )
    } else if survival_months <= dec!(36) {
        (
            Severity::Low,
            "Estimated survival is under three years; structural weaknesses shorten the expected operating life.",
        )
    } else {
        return;
    };
    cards.push(RiskCard {
        id: "survival_threshold".into(),
        title: "Short expected operating life".into(),
        severity,
        evidence: json!({ "survivalMonths": survival_months }),
        narrative: narrative.into(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::BrandProfile;
    use crate::finance;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn fixture(
        target: Decimal,
        rent: Decimal,
        loans: Vec<Loan>,
        decline: Option<Decimal>,
    ) -> FinanceResult {
        let brand = BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            decline_rate_3yr: decline,
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let site = SiteConditions {
            initial_investment: dec!(200_000_000),
            monthly_rent: rent,
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

    fn card_ids(cards: &[RiskCard]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn healthy_site_fires_no_cards() {
        let f = fixture(dec!(300), dec!(4_000_000), vec![], None);
        let cards = generate(&f, dec!(40));
        assert!(cards.is_empty(), "unexpected cards: {:?}", card_ids(&cards));
    }

    #[test]
    fn heavy_rent_fires_rent_burden() {
        let f = fixture(dec!(300), dec!(7_000_000), vec![], None);
        let cards = generate(&f, dec!(40));
        let card = cards.iter().find(|c| c.id == "rent_burden").unwrap();
        // 7M / 31.5M = 22.2% > 20% => high
        assert_eq!(card.severity, Severity::High);
        assert!(card.evidence["rentShare"].is_string() || card.evidence["rentShare"].is_number());
    }

    #[test]
    fn loss_making_site_gets_dedicated_card() {
        let f = fixture(dec!(50), dec!(4_000_000), vec![], None);
        let cards = generate(&f, dec!(12));
        let ids = card_ids(&cards);
        assert!(ids.contains(&"negative_profit"));
        assert!(!ids.contains(&"payback_long"));
        let survival = cards.iter().find(|c| c.id == "survival_threshold").unwrap();
        assert_eq!(survival.severity, Severity::High);
    }

    #[test]
    fn dscr_under_one_is_high_severity_stress() {
        let loans = vec![Loan {
            principal: dec!(500_000_000),
            annual_rate: dec!(0.09),
            term_months: 36,
            repayment_style: RepaymentStyle::EqualPayment,
        }];
        let f = fixture(dec!(300), dec!(4_000_000), loans, None);
        assert!(f.debt.dscr.unwrap() < Decimal::ONE);
        let cards = generate(&f, dec!(20));
        let card = cards.iter().find(|c| c.id == "dscr_stress").unwrap();
        assert_eq!(card.severity, Severity::High);
    }

    #[test]
    fn decline_severity_scales_with_magnitude() {
        let low = fixture(dec!(300), dec!(4_000_000), vec![], Some(dec!(0.12)));
        let cards = generate(&low, dec!(40));
        let card = cards.iter().find(|c| c.id == "brand_decline").unwrap();
        assert_eq!(card.severity, Severity::Low);

        let high = fixture(dec!(300), dec!(4_000_000), vec![], Some(dec!(0.32)));
        let cards = generate(&high, dec!(40));
        let card = cards.iter().find(|c| c.id == "brand_decline").unwrap();
        assert_eq!(card.severity, Severity::High);
    }

    #[test]
    fn cards_are_additive_across_rule_families() {
        let loans = vec![Loan {
            principal: dec!(500_000_000),
            annual_rate: dec!(0.09),
            term_months: 36,
            repayment_style: RepaymentStyle::EqualPayment,
        }];
        let f = fixture(dec!(300), dec!(7_500_000), loans, Some(dec!(0.25)));
        let cards = generate(&f, dec!(12));
        let ids = card_ids(&cards);
        assert!(ids.contains(&"rent_burden"));
        assert!(ids.contains(&"dscr_stress"));
        assert!(ids.contains(&"brand_decline"));
        assert!(ids.contains(&"survival_threshold"));
    }

    #[test]
    fn risk_factors_project_the_same_list() {
        let f = fixture(dec!(50), dec!(4_000_000), vec![], None);
        let cards = generate(&f, dec!(12));
        let factors = risk_factors(&cards);
        assert_eq!(factors.len(), cards.len());
        assert_eq!(factors[0], cards[0].narrative);
    }
}
