use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::{self, AmortizationResult};
use crate::brand::{ResolvedBrandProfile, validate_site};
use crate::{EngineError, EngineResult, types::*};

pub const DAYS_PER_MONTH: Decimal = dec!(30);

/// Revenue haircut per unit of brand risk: factor = 1 − 0.4 × risk.
const RISK_REVENUE_HAIRCUT: Decimal = dec!(0.4);

/// Demand expectation chain output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedDemand {
    /// The resolved independent demand signal, after the fallback chain.
    pub expected_daily_sales: Decimal,
    /// (target − base) / base, positive when the target overshoots demand.
    pub gap_pct_vs_target: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_expected_daily_sales: Option<Decimal>,
    pub revenue_adjustment_factor: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_decline_rate: Option<Rate>,
    /// Set when no independent demand signal existed and the target had to
    /// stand in for itself, forcing GAP to zero.
    pub gap_warning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCosts {
    pub rent: Money,
    pub labor: Money,
    pub materials: Money,
    pub utilities: Money,
    pub royalty: Money,
    pub marketing: Money,
    pub etc: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtService {
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Operating profit over debt payment. None when the site carries no debt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<Decimal>,
}

/// One recomputed volume scenario, rent/etc and debt service held fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityCase {
    pub target_daily_sales: Decimal,
    pub monthly_revenue: Money,
    pub operating_profit: Money,
    pub monthly_profit: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_months: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensitivity {
    pub plus10: SensitivityCase,
    pub minus10: SensitivityCase,
}

/// Complete profit/loss projection for one target volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceResult {
    pub monthly_revenue: Money,
    pub expected: ExpectedDemand,
    pub monthly_costs: MonthlyCosts,
    pub operating_profit: Money,
    pub monthly_profit: Money,
    /// None whenever monthly profit is non-positive. Never Infinity/NaN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_months: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_daily_sales: Option<Decimal>,
    pub debt: DebtService,
    pub sensitivity: Sensitivity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_table: Option<Vec<SensitivityCase>>,
}

impl FinanceResult {
    /// Share of revenue consumed by fixed costs (rent + etc).
    pub fn fixed_cost_share(&self) -> Decimal {
        if self.monthly_revenue.is_zero() {
            return Decimal::ZERO;
        }
        (self.monthly_costs.rent + self.monthly_costs.etc) / self.monthly_revenue
    }

    /// Net margin on revenue.
    pub fn profit_margin(&self) -> Decimal {
        if self.monthly_revenue.is_zero() {
            return Decimal::ZERO;
        }
        self.monthly_profit / self.monthly_revenue
    }

    pub fn rent_share(&self) -> Decimal {
        if self.monthly_revenue.is_zero() {
            return Decimal::ZERO;
        }
        self.monthly_costs.rent / self.monthly_revenue
    }
}

/// Brand risk score from the three-year decline rate.
/// Under 10% scores 0.2, then 0.5, 0.8, and 1.0 at the 10/20/30% bands.
pub fn brand_risk_score(decline_rate: Rate) -> Decimal {
    if decline_rate >= dec!(0.30) {
        Decimal::ONE
    } else if decline_rate >= dec!(0.20) {
        dec!(0.8)
    } else if decline_rate >= dec!(0.10) {
        dec!(0.5)
    } else {
        dec!(0.2)
    }
}

/// Run the full finance model, amortizing the site's loans internally.
pub fn calculate(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    market: &MarketSnapshot,
    target_daily_sales: Decimal,
) -> EngineResult<FinanceResult> {
    let amort = amortization::amortize(&site.loans)?;
    calculate_with_amortization(brand, site, market, target_daily_sales, &amort)
}

/// Run the full finance model against a precomputed amortization result.
/// Scoring, sensitivity, and simulation passes reuse the same result
/// instead of re-deriving schedules on every nested call.
pub fn calculate_with_amortization(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    market: &MarketSnapshot,
    target_daily_sales: Decimal,
    amort: &AmortizationResult,
) -> EngineResult<FinanceResult> {
    validate_site(site)?;
    if target_daily_sales <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "target_daily_sales".into(),
            reason: "Target daily sales must be positive.".into(),
        });
    }

    let expected = resolve_expected_demand(brand, market, target_daily_sales);

    let monthly_revenue = target_daily_sales * brand.avg_price * DAYS_PER_MONTH;
    let monthly_costs = costs_at(brand, site, monthly_revenue);

    let operating_profit = monthly_revenue - monthly_costs.total;
    let monthly_profit = operating_profit - amort.total_monthly_payment;

    let dscr = if amort.has_debt() {
        Some(operating_profit / amort.total_monthly_payment)
    } else {
        None
    };

    let payback_months = payback(site.initial_investment, monthly_profit);
    let break_even_daily_sales = break_even(brand.avg_price, monthly_costs.total);

    let sensitivity = Sensitivity {
        plus10: volume_case(brand, site, amort, target_daily_sales * dec!(1.10)),
        minus10: volume_case(brand, site, amort, target_daily_sales * dec!(0.90)),
    };

    let scenario_table = Some(
        [dec!(0.80), dec!(0.90), dec!(1.00), dec!(1.10), dec!(1.20)]
            .iter()
            .map(|scale| volume_case(brand, site, amort, target_daily_sales * scale))
            .collect(),
    );

    Ok(FinanceResult {
        monthly_revenue,
        expected,
        monthly_costs,
        operating_profit,
        monthly_profit,
        payback_months,
        break_even_daily_sales,
        debt: DebtService {
            payment: amort.total_monthly_payment,
            interest: amort.total_monthly_interest,
            principal: amort.total_monthly_principal,
            dscr,
        },
        sensitivity,
        scenario_table,
    })
}

/// Resolve the independent demand signal and the GAP against the target.
///
/// Fallback order: brand-average-derived adjusted value, then the market
/// snapshot, then the brand default, then the target itself. The final
/// fallback sets `gap_warning` and forces GAP to zero, since no independent
/// signal existed.
fn resolve_expected_demand(
    brand: &ResolvedBrandProfile,
    market: &MarketSnapshot,
    target_daily_sales: Decimal,
) -> ExpectedDemand {
    let raw_expected = brand.avg_monthly_sales.map(|monthly| {
        monthly / (brand.avg_price * DAYS_PER_MONTH)
    });

    let revenue_adjustment_factor = match brand.decline_rate_3yr {
        Some(decline) => Decimal::ONE - RISK_REVENUE_HAIRCUT * brand_risk_score(decline),
        None => Decimal::ONE,
    };
    let adjusted = raw_expected.map(|raw| raw * revenue_adjustment_factor);

    let mut gap_warning = false;
    let expected_daily_sales = adjusted
        .or(market.expected_daily_sales)
        .or(brand.default_daily_sales)
        .unwrap_or_else(|| {
            gap_warning = true;
            target_daily_sales
        });

    let gap_base = adjusted.unwrap_or(expected_daily_sales);
    let gap_pct_vs_target = if gap_warning || gap_base.is_zero() {
        Decimal::ZERO
    } else {
        (target_daily_sales - gap_base) / gap_base
    };

    if gap_warning {
        tracing::warn!(
            target_daily_sales = %target_daily_sales,
            "no independent demand signal; GAP forced to zero"
        );
    }

    ExpectedDemand {
        expected_daily_sales,
        gap_pct_vs_target,
        adjusted_expected_daily_sales: adjusted,
        revenue_adjustment_factor,
        brand_decline_rate: brand.decline_rate_3yr,
        gap_warning,
    }
}

/// Cost buckets at a given revenue level. Rent and etc are fixed; every
/// other bucket scales with revenue; labor gets the owner-working discount.
fn costs_at(brand: &ResolvedBrandProfile, site: &SiteConditions, revenue: Money) -> MonthlyCosts {
    let labor_factor = if site.owner_working {
        brand.owner_working_discount
    } else {
        Decimal::ONE
    };
    let rent = site.monthly_rent;
    let labor = revenue * brand.labor_rate * labor_factor;
    let materials = revenue * brand.cogs_rate;
    let utilities = revenue * brand.utilities_rate;
    let royalty = revenue * brand.royalty_rate;
    let marketing = revenue * brand.marketing_rate;
    let etc = brand.etc_fixed_cost;
    let total = rent + labor + materials + utilities + royalty + marketing + etc;
    MonthlyCosts {
        rent,
        labor,
        materials,
        utilities,
        royalty,
        marketing,
        etc,
        total,
    }
}

fn volume_case(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    amort: &AmortizationResult,
    daily_sales: Decimal,
) -> SensitivityCase {
    let revenue = daily_sales * brand.avg_price * DAYS_PER_MONTH;
    let costs = costs_at(brand, site, revenue);
    let operating_profit = revenue - costs.total;
    let monthly_profit = operating_profit - amort.total_monthly_payment;
    SensitivityCase {
        target_daily_sales: daily_sales,
        monthly_revenue: revenue,
        operating_profit,
        monthly_profit,
        payback_months: payback(site.initial_investment, monthly_profit),
    }
}

fn payback(investment: Money, monthly_profit: Money) -> Option<Decimal> {
    if monthly_profit > Decimal::ZERO {
        Some(investment / monthly_profit)
    } else {
        None
    }
}

fn break_even(avg_price: Money, total_costs: Money) -> Option<Decimal> {
    if total_costs > Decimal::ZERO && avg_price > Decimal::ZERO {
        Some(total_costs / (avg_price * DAYS_PER_MONTH))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::BrandProfile;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn brand() -> ResolvedBrandProfile {
        BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn site() -> SiteConditions {
        SiteConditions {
            initial_investment: dec!(200_000_000),
            monthly_rent: dec!(4_000_000),
            area_size: dec!(60),
            owner_working: true,
            loans: vec![],
            key_money: None,
            demolition_base_cost: None,
            demolition_per_area_cost: None,
        }
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            expected_daily_sales: Some(dec!(280)),
            market_score: dec!(72),
        }
    }

    #[test]
    fn baseline_cafe_is_profitable() {
        let result = calculate(&brand(), &site(), &market(), dec!(300)).unwrap();
        assert_eq!(result.monthly_revenue, dec!(31_500_000));
        assert!(result.monthly_profit > Decimal::ZERO);
        let payback = result.payback_months.expect("profitable site has a payback");
        assert!(payback > Decimal::ZERO);
    }

    #[test]
    fn cost_buckets_follow_rates() {
        let result = calculate(&brand(), &site(), &market(), dec!(300)).unwrap();
        let c = &result.monthly_costs;
        assert_eq!(c.materials, dec!(11_025_000)); // 35% of 31.5M
        assert_eq!(c.labor, dec!(5_040_000)); // 20% * 0.8 owner discount
        assert_eq!(c.utilities, dec!(945_000));
        assert_eq!(c.royalty, dec!(1_260_000));
        assert_eq!(c.marketing, dec!(630_000));
        assert_eq!(c.rent, dec!(4_000_000));
        assert_eq!(c.etc, dec!(500_000));
        assert_eq!(c.total, dec!(23_400_000));
    }

    #[test]
    fn owner_absent_pays_full_labor() {
        let mut s = site();
        s.owner_working = false;
        let result = calculate(&brand(), &s, &market(), dec!(300)).unwrap();
        assert_eq!(result.monthly_costs.labor, dec!(6_300_000));
    }

    #[test]
    fn unprofitable_volume_yields_null_payback() {
        let result = calculate(&brand(), &site(), &market(), dec!(50)).unwrap();
        assert!(result.monthly_profit <= Decimal::ZERO);
        assert_eq!(result.payback_months, None);
    }

    #[test]
    fn payback_invariant_holds_in_sensitivity_cases() {
        for target in [dec!(50), dec!(120), dec!(300)] {
            let result = calculate(&brand(), &site(), &market(), target).unwrap();
            for case in [&result.sensitivity.plus10, &result.sensitivity.minus10] {
                assert_eq!(
                    case.monthly_profit <= Decimal::ZERO,
                    case.payback_months.is_none()
                );
            }
        }
    }

    #[test]
    fn rent_increase_never_increases_profit() {
        let base = calculate(&brand(), &site(), &market(), dec!(300)).unwrap();
        let mut pricier = site();
        pricier.monthly_rent = dec!(6_000_000);
        let worse = calculate(&brand(), &pricier, &market(), dec!(300)).unwrap();
        assert!(worse.monthly_profit < base.monthly_profit);
    }

    #[test]
    fn volume_increase_never_decreases_revenue() {
        let low = calculate(&brand(), &site(), &market(), dec!(200)).unwrap();
        let high = calculate(&brand(), &site(), &market(), dec!(250)).unwrap();
        assert!(high.monthly_revenue > low.monthly_revenue);
    }

    #[test]
    fn debt_service_reduces_profit_and_sets_dscr() {
        let mut s = site();
        s.loans = vec![Loan {
            principal: dec!(100_000_000),
            annual_rate: dec!(0.05),
            term_months: 60,
            repayment_style: RepaymentStyle::EqualPayment,
        }];
        let unlevered = calculate(&brand(), &site(), &market(), dec!(300)).unwrap();
        let levered = calculate(&brand(), &s, &market(), dec!(300)).unwrap();
        assert!(levered.monthly_profit < unlevered.monthly_profit);
        let dscr = levered.debt.dscr.expect("levered site has a DSCR");
        assert!(dscr > Decimal::ONE);
        assert_eq!(unlevered.debt.dscr, None);
    }

    #[test]
    fn gap_positive_when_target_overshoots_market() {
        let m = MarketSnapshot {
            expected_daily_sales: Some(dec!(200)),
            market_score: dec!(60),
        };
        let result = calculate(&brand(), &site(), &m, dec!(300)).unwrap();
        assert_eq!(result.expected.expected_daily_sales, dec!(200));
        assert_eq!(result.expected.gap_pct_vs_target, dec!(0.5));
        assert!(!result.expected.gap_warning);
    }

    #[test]
    fn decline_rate_adjusts_brand_expectation() {
        let mut profile = BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            // 280/day at brand average
            avg_monthly_sales: Some(dec!(29_400_000)),
            decline_rate_3yr: Some(dec!(0.25)),
            ..Default::default()
        };
        let resolved = profile.resolve().unwrap();
        let result = calculate(&resolved, &site(), &market(), dec!(300)).unwrap();
        // risk 0.8 => factor 1 - 0.4*0.8 = 0.68; adjusted = 280 * 0.68 = 190.4
        assert_eq!(result.expected.revenue_adjustment_factor, dec!(0.68));
        assert_eq!(
            result.expected.adjusted_expected_daily_sales,
            Some(dec!(190.4))
        );
        // GAP uses the adjusted base even though market data exists
        let expected_gap = (dec!(300) - dec!(190.4)) / dec!(190.4);
        assert_eq!(result.expected.gap_pct_vs_target, expected_gap);

        // Mild decline keeps a small haircut
        profile.decline_rate_3yr = Some(dec!(0.05));
        let resolved = profile.resolve().unwrap();
        let result = calculate(&resolved, &site(), &market(), dec!(300)).unwrap();
        assert_eq!(result.expected.revenue_adjustment_factor, dec!(0.92));
    }

    #[test]
    fn target_fallback_sets_gap_warning() {
        let m = MarketSnapshot {
            expected_daily_sales: None,
            market_score: dec!(50),
        };
        let result = calculate(&brand(), &site(), &m, dec!(300)).unwrap();
        assert!(result.expected.gap_warning);
        assert_eq!(result.expected.gap_pct_vs_target, dec!(0));
        assert_eq!(result.expected.expected_daily_sales, dec!(300));
    }

    #[test]
    fn brand_default_precedes_target_fallback() {
        let resolved = BrandProfile {
            avg_price: Some(dec!(3500)),
            cogs_rate: Some(dec!(0.35)),
            labor_rate: Some(dec!(0.20)),
            default_daily_sales: Some(dec!(220)),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let m = MarketSnapshot {
            expected_daily_sales: None,
            market_score: dec!(50),
        };
        let result = calculate(&resolved, &site(), &m, dec!(300)).unwrap();
        assert!(!result.expected.gap_warning);
        assert_eq!(result.expected.expected_daily_sales, dec!(220));
    }

    #[test]
    fn break_even_sits_between_profitable_and_losing_volumes() {
        let result = calculate(&brand(), &site(), &market(), dec!(300)).unwrap();
        let be = result.break_even_daily_sales.unwrap();
        assert!(be > dec!(50) && be < dec!(300));
    }

    #[test]
    fn non_positive_target_rejected() {
        let err = calculate(&brand(), &site(), &market(), dec!(0)).unwrap_err();
        match err {
            EngineError::InvalidInput { field, .. } => assert_eq!(field, "target_daily_sales"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
