use feasibility_core::amortization;
use feasibility_core::brand::BrandProfile;
use feasibility_core::finance;
use feasibility_core::{Loan, MarketSnapshot, RepaymentStyle, SiteConditions};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn brand() -> feasibility_core::brand::ResolvedBrandProfile {
    BrandProfile {
        avg_price: Some(dec!(3500)),
        cogs_rate: Some(dec!(0.35)),
        labor_rate: Some(dec!(0.20)),
        ..Default::default()
    }
    .resolve()
    .unwrap()
}

fn site(loans: Vec<Loan>) -> SiteConditions {
    SiteConditions {
        initial_investment: dec!(200_000_000),
        monthly_rent: dec!(4_000_000),
        area_size: dec!(60),
        owner_working: true,
        loans,
        key_money: None,
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

// ===========================================================================
// Amortization reference values
// ===========================================================================

#[test]
fn annuity_payment_matches_the_standard_formula() {
    // 100M, 5% APR, 60 months: the canonical reference loan
    let result = amortization::amortize(&[Loan {
        principal: dec!(100_000_000),
        annual_rate: dec!(0.05),
        term_months: 60,
        repayment_style: RepaymentStyle::EqualPayment,
    }])
    .unwrap();
    let diff = (result.total_monthly_payment - dec!(1_887_123.74)).abs();
    assert!(diff < dec!(1), "payment off by {diff}");
}

#[test]
fn every_preview_month_conserves_payment_interest_principal() {
    let result = amortization::amortize(&[Loan {
        principal: dec!(100_000_000),
        annual_rate: dec!(0.05),
        term_months: 60,
        repayment_style: RepaymentStyle::EqualPayment,
    }])
    .unwrap();
    for row in &result.per_loan[0].months {
        let drift = (row.payment - (row.interest + row.principal)).abs();
        assert!(drift < dec!(0.000001), "month {}", row.month);
    }
}

// ===========================================================================
// Finance model through the debt stack
// ===========================================================================

#[test]
fn dscr_reflects_operating_profit_over_debt_payment() {
    let loans = vec![Loan {
        principal: dec!(100_000_000),
        annual_rate: dec!(0.05),
        term_months: 60,
        repayment_style: RepaymentStyle::EqualPayment,
    }];
    let result = finance::calculate(&brand(), &site(loans), &market(), dec!(300)).unwrap();
    let dscr = result.debt.dscr.unwrap();
    let expected = result.operating_profit / result.debt.payment;
    assert_eq!(dscr, expected);
}

#[test]
fn sensitivity_holds_debt_and_fixed_costs_constant() {
    let loans = vec![Loan {
        principal: dec!(100_000_000),
        annual_rate: dec!(0.05),
        term_months: 60,
        repayment_style: RepaymentStyle::EqualPayment,
    }];
    let result = finance::calculate(&brand(), &site(loans), &market(), dec!(300)).unwrap();
    let plus = &result.sensitivity.plus10;
    let minus = &result.sensitivity.minus10;

    // Revenue scales exactly with volume
    assert_eq!(plus.monthly_revenue, result.monthly_revenue * dec!(1.10));
    assert_eq!(minus.monthly_revenue, result.monthly_revenue * dec!(0.90));

    // The profit swing equals the contribution-margin swing: debt and
    // fixed costs cancel out of the difference
    let variable_margin = dec!(1) - (dec!(0.35) + dec!(0.20) * dec!(0.8) + dec!(0.03) + dec!(0.04) + dec!(0.02));
    let expected_swing = result.monthly_revenue * dec!(0.10) * variable_margin;
    assert_eq!(plus.monthly_profit - result.monthly_profit, expected_swing);
    assert_eq!(result.monthly_profit - minus.monthly_profit, expected_swing);
}

#[test]
fn scenario_table_spans_eighty_to_one_twenty_pct() {
    let result = finance::calculate(&brand(), &site(vec![]), &market(), dec!(300)).unwrap();
    let table = result.scenario_table.unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(table[0].target_daily_sales, dec!(240));
    assert_eq!(table[4].target_daily_sales, dec!(360));
    // Profit is monotone in volume
    let profits: Vec<Decimal> = table.iter().map(|c| c.monthly_profit).collect();
    assert!(profits.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn reported_break_even_is_a_conservative_upper_bound() {
    let result = finance::calculate(&brand(), &site(vec![]), &market(), dec!(300)).unwrap();
    let be = result.break_even_daily_sales.unwrap();

    // break_even_daily_sales divides total costs at the *target* volume by
    // unit revenue, so it sits above the contribution break-even: running
    // at the reported volume is already profitable, while volumes well
    // below it lose money.
    let at_be = finance::calculate(&brand(), &site(vec![]), &market(), be).unwrap();
    assert!(at_be.monthly_profit >= Decimal::ZERO);

    let low = finance::calculate(&brand(), &site(vec![]), &market(), dec!(100)).unwrap();
    assert!(low.monthly_profit < Decimal::ZERO);
}
