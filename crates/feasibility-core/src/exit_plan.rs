use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::brand::ResolvedBrandProfile;
use crate::finance::FinanceResult;
use crate::types::*;

/// Cumulative loss reaching this share of the investment raises the
/// warning flag.
const WARNING_LOSS_SHARE: Decimal = dec!(0.20);
/// Loss overshoot past the optimum that marks the start of the trap zone.
const TRAP_OVERSHOOT_SHARE: Decimal = dec!(0.10);
/// Consecutive loss months that raise the warning flag.
const WARNING_LOSS_MONTHS: u32 = 3;

/// Month-indexed step curve: fraction for the first matching month bound,
/// tail fraction beyond the last bound.
struct StepCurve {
    steps: &'static [(u32, Decimal)],
    tail: Decimal,
}

impl StepCurve {
    fn at(&self, month: u32) -> Decimal {
        for (bound, fraction) in self.steps {
            if month <= *bound {
                return *fraction;
            }
        }
        self.tail
    }
}

/// Interior salvage: how much of the interior investment resells with the
/// fixtures, by exit month.
const STANDARD_SALVAGE: StepCurve = StepCurve {
    steps: &[
        (6, dec!(0.40)),
        (12, dec!(0.30)),
        (24, dec!(0.20)),
        (36, dec!(0.10)),
    ],
    tail: dec!(0.05),
};

/// Key-money recovery: the share of the entry deposit a departing tenant
/// recovers, by exit month.
const STANDARD_RECOVERY: StepCurve = StepCurve {
    steps: &[
        (6, dec!(0.90)),
        (12, dec!(0.80)),
        (24, dec!(0.70)),
        (36, dec!(0.60)),
    ],
    tail: dec!(0.50),
};

fn curves_for(key: &str) -> (&'static StepCurve, &'static StepCurve) {
    match key {
        "standard" => (&STANDARD_SALVAGE, &STANDARD_RECOVERY),
        other => {
            tracing::warn!(curve = other, "unknown exit curve policy; using standard");
            (&STANDARD_SALVAGE, &STANDARD_RECOVERY)
        }
    }
}

/// Exit economics for one candidate month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitMonth {
    pub month: u32,
    pub penalty_cost: Money,
    pub demolition_cost: Money,
    pub interior_loss: Money,
    pub goodwill_recovered: Money,
    pub cumulative_operating_loss: Money,
    pub total_loss: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPlan {
    pub months: Vec<ExitMonth>,
    /// Month minimizing total cumulative loss over the horizon.
    pub optimal_exit_month: u32,
    /// Earliest month where cumulative loss reaches 20% of the investment
    /// or profit has been non-positive for three consecutive months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_month: Option<u32>,
    /// First month past the optimum where the loss overshoot exceeds 10%
    /// of the investment. Leaving after this point compounds the damage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trap_zone_start_month: Option<u32>,
}

/// Project exit cost across the horizon and find the loss-minimizing month.
///
/// Monthly profit is held constant across the horizon; the series type
/// admits a per-month trajectory but the reference model does not vary it.
pub fn build(
    brand: &ResolvedBrandProfile,
    site: &SiteConditions,
    finance: &FinanceResult,
    horizon_months: u32,
) -> ExitPlan {
    let (salvage, recovery) = curves_for(&brand.curve_key);

    let monthly_royalty = finance.monthly_costs.royalty;
    let monthly_loss = (-finance.monthly_profit).max(Decimal::ZERO);
    let interior_investment = site.initial_investment * brand.interior_cost_ratio;
    let key_money = site.key_money.unwrap_or(Decimal::ZERO);
    let demolition = site
        .demolition_base_cost
        .unwrap_or(crate::brand::DEFAULT_DEMOLITION_BASE_COST)
        + site
            .demolition_per_area_cost
            .unwrap_or(crate::brand::DEFAULT_DEMOLITION_PER_AREA_COST)
            * site.area_size;

    let mut months = Vec::with_capacity(horizon_months as usize);
    for m in 1..=horizon_months {
        let penalty_cost = match brand.fixed_penalty {
            Some(penalty) => penalty,
            None => {
                let remaining = brand.contract_term_months.saturating_sub(m);
                Decimal::from(remaining) * monthly_royalty
            }
        };
        let interior_loss = interior_investment * (Decimal::ONE - salvage.at(m));
        let goodwill_recovered = key_money * recovery.at(m);
        let cumulative_operating_loss = Decimal::from(m) * monthly_loss;
        let total_loss = cumulative_operating_loss + penalty_cost + demolition + interior_loss
            - goodwill_recovered;
        months.push(ExitMonth {
            month: m,
            penalty_cost,
            demolition_cost: demolition,
            interior_loss,
            goodwill_recovered,
            cumulative_operating_loss,
            total_loss,
        });
    }

    let optimal_exit_month = months
        .iter()
        .min_by(|a, b| a.total_loss.cmp(&b.total_loss))
        .map(|m| m.month)
        .unwrap_or(1);
    let optimal_loss = months[optimal_exit_month as usize - 1].total_loss;

    let loss_threshold = site.initial_investment * WARNING_LOSS_SHARE;
    let cumulative_warning = months
        .iter()
        .find(|m| m.cumulative_operating_loss >= loss_threshold)
        .map(|m| m.month);
    let streak_warning = if finance.monthly_profit <= Decimal::ZERO
        && horizon_months >= WARNING_LOSS_MONTHS
    {
        Some(WARNING_LOSS_MONTHS)
    } else {
        None
    };
    let warning_month = match (cumulative_warning, streak_warning) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };

    let trap_threshold = optimal_loss + site.initial_investment * TRAP_OVERSHOOT_SHARE;
    let trap_zone_start_month = months
        .iter()
        .filter(|m| m.month > optimal_exit_month)
        .find(|m| m.total_loss >= trap_threshold)
        .map(|m| m.month);

    ExitPlan {
        months,
        optimal_exit_month,
        warning_month,
        trap_zone_start_month,
    }
}
