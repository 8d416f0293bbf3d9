use feasibility_core::brand::BrandProfile;
use feasibility_core::decision::DecisionEngine;
use feasibility_core::scoring::HardCutReason;
use feasibility_core::{
    EngineConfig, Loan, MarketSnapshot, RepaymentStyle, RoadviewAssessment, Severity, Signal,
    SiteConditions,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Shared fixtures: a mid-range franchise cafe in a decent location
// ===========================================================================

fn cafe_brand() -> BrandProfile {
    BrandProfile {
        avg_price: Some(dec!(3500)),
        cogs_rate: Some(dec!(0.35)),
        labor_rate: Some(dec!(0.20)),
        ..Default::default()
    }
}

fn cafe_site() -> SiteConditions {
    SiteConditions {
        initial_investment: dec!(200_000_000),
        monthly_rent: dec!(4_000_000),
        area_size: dec!(60),
        owner_working: true,
        loans: vec![],
        key_money: Some(dec!(30_000_000)),
        demolition_base_cost: None,
        demolition_per_area_cost: None,
    }
}

fn market() -> MarketSnapshot {
    MarketSnapshot {
        expected_daily_sales: Some(dec!(290)),
        market_score: dec!(75),
    }
}

fn roadview() -> RoadviewAssessment {
    RoadviewAssessment {
        risk_score: dec!(80),
        overall_risk: None,
    }
}

fn engine() -> DecisionEngine {
    DecisionEngine::new(EngineConfig::default())
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn profitable_cafe_at_300_per_day() {
    let output = engine()
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(300))
        .unwrap();
    let f = &output.result.finance;

    assert_eq!(f.monthly_revenue, dec!(31_500_000));
    assert!(f.monthly_profit > Decimal::ZERO);
    let payback = f.payback_months.expect("profitable site recovers its investment");
    assert!(payback > Decimal::ZERO && payback < dec!(60));
}

#[test]
fn unprofitable_volume_is_a_hard_red() {
    let output = engine()
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(50))
        .unwrap();
    let r = &output.result;

    assert!(r.finance.monthly_profit <= Decimal::ZERO);
    assert_eq!(r.finance.payback_months, None);
    assert_eq!(r.signal, Signal::Red);
    assert!(r.final_judgement.non_negotiable);
    assert!(r
        .risk_cards
        .iter()
        .any(|c| c.id == "negative_profit" && c.severity == Severity::High));
}

#[test]
fn oversized_loan_forces_dscr_red_with_high_severity_card() {
    let mut site = cafe_site();
    site.loans = vec![Loan {
        principal: dec!(500_000_000),
        annual_rate: dec!(0.09),
        term_months: 36,
        repayment_style: RepaymentStyle::EqualPayment,
    }];
    let output = engine()
        .analyze(&cafe_brand(), &site, &market(), &roadview(), dec!(300))
        .unwrap();
    let r = &output.result;

    assert!(r.finance.debt.dscr.unwrap() < Decimal::ONE);
    assert_eq!(r.signal, Signal::Red);
    assert!(r.hard_cut_reasons.contains(&HardCutReason::DscrBelowOne));
    let card = r
        .risk_cards
        .iter()
        .find(|c| c.id == "dscr_stress")
        .expect("stressed site carries a debt-service card");
    assert_eq!(card.severity, Severity::High);
    assert!(r
        .failure_triggers
        .iter()
        .any(|t| t.code == "debt_service_shortfall"));
}

#[test]
fn thirty_pct_brand_decline_is_red_via_reason_code() {
    let mut brand = cafe_brand();
    brand.decline_rate_3yr = Some(dec!(0.30));
    let output = engine()
        .analyze(&brand, &cafe_site(), &market(), &roadview(), dec!(300))
        .unwrap();
    let r = &output.result;

    assert_eq!(r.signal, Signal::Red);
    assert!(r.hard_cut_reasons.contains(&HardCutReason::BrandDeclineHigh));
    assert_eq!(
        r.hard_cut_reasons
            .iter()
            .find(|c| **c == HardCutReason::BrandDeclineHigh)
            .unwrap()
            .code(),
        "BRAND_DECLINE_HIGH"
    );
}

// ===========================================================================
// Cross-cutting invariants
// ===========================================================================

#[test]
fn success_probability_is_score_over_100() {
    for target in [dec!(50), dec!(150), dec!(300), dec!(500)] {
        let output = engine()
            .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), target)
            .unwrap();
        let s = &output.result.score;
        assert_eq!(s.success_probability, s.score / dec!(100));
    }
}

#[test]
fn payback_nullability_tracks_profit_sign_across_targets() {
    for target in [dec!(40), dec!(80), dec!(160), dec!(320)] {
        let output = engine()
            .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), target)
            .unwrap();
        let f = &output.result.finance;
        assert_eq!(f.monthly_profit <= Decimal::ZERO, f.payback_months.is_none());
    }
}

#[test]
fn hard_cuts_dominate_even_a_perfect_score_environment() {
    // Best possible market and roadview cannot rescue a loss-making site
    let great_market = MarketSnapshot {
        expected_daily_sales: Some(dec!(55)),
        market_score: dec!(100),
    };
    let great_road = RoadviewAssessment {
        risk_score: dec!(100),
        overall_risk: None,
    };
    let output = engine()
        .analyze(&cafe_brand(), &cafe_site(), &great_market, &great_road, dec!(50))
        .unwrap();
    assert_eq!(output.result.signal, Signal::Red);
}

#[test]
fn rent_monotonicity_holds_through_the_orchestrator() {
    let cheap = engine()
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(300))
        .unwrap();
    let mut site = cafe_site();
    site.monthly_rent = dec!(8_000_000);
    let pricey = engine()
        .analyze(&cafe_brand(), &site, &market(), &roadview(), dec!(300))
        .unwrap();
    assert!(pricey.result.finance.monthly_profit < cheap.result.finance.monthly_profit);
}

#[test]
fn survival_floor_is_twelve_months() {
    let output = engine()
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(40))
        .unwrap();
    assert!(output.result.survival.months >= dec!(12));
}

#[test]
fn lenient_engine_accepts_the_same_inputs() {
    let config = EngineConfig {
        strict_validation: false,
        ..Default::default()
    };
    let output = DecisionEngine::new(config)
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(300))
        .unwrap();
    assert_eq!(output.result.signal, Signal::Green);
}

#[test]
fn result_round_trips_through_json() {
    let output = engine()
        .analyze(&cafe_brand(), &cafe_site(), &market(), &roadview(), dec!(300))
        .unwrap();
    let json = serde_json::to_string(&output).unwrap();
    assert!(json.contains("\"finalJudgement\""));
    assert!(json.contains("\"nonNegotiable\""));
    assert!(json.contains("\"optimalExitMonth\""));

    let parsed: feasibility_core::ComputationOutput<
        feasibility_core::decision::DecisionResult,
    > = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.result.signal, output.result.signal);
    assert_eq!(parsed.result.score.score, output.result.score.score);
}
