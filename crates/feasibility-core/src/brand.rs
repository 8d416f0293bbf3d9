use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult, types::*};

pub const DEFAULT_UTILITIES_RATE: Rate = dec!(0.03);
pub const DEFAULT_ROYALTY_RATE: Rate = dec!(0.04);
pub const DEFAULT_MARKETING_RATE: Rate = dec!(0.02);
pub const DEFAULT_ETC_FIXED_COST: Money = dec!(500_000);
/// Labor bill multiplier applied when the owner staffs the counter.
pub const DEFAULT_OWNER_WORKING_DISCOUNT: Rate = dec!(0.8);
pub const DEFAULT_INTERIOR_COST_RATIO: Rate = dec!(0.40);
pub const DEFAULT_CONTRACT_TERM_MONTHS: u32 = 36;
pub const DEFAULT_DEMOLITION_BASE_COST: Money = dec!(5_000_000);
pub const DEFAULT_DEMOLITION_PER_AREA_COST: Money = dec!(150_000);
pub const DEFAULT_CURVE_KEY: &str = "standard";

/// Exit-cost policy defaults a franchise headquarters publishes for the brand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitPolicyDefaults {
    /// Flat early-termination penalty. When absent, the penalty is
    /// remaining contract months times the monthly royalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_penalty: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_term_months: Option<u32>,
    /// Share of the initial investment sunk into interior work.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interior_cost_ratio: Option<Rate>,
    /// Named salvage/recovery curve policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

/// Brand economics as loaded from the brand-data collaborator. Only
/// avg_price, cogs_rate, and labor_rate are required; everything else
/// defaults during resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cogs_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilities_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub royalty_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etc_fixed_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_working_discount: Option<Rate>,
    /// Brand-average monthly revenue across existing stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_monthly_sales: Option<Money>,
    /// Brand-published default daily unit volume, used as a demand
    /// fallback when neither store averages nor market data exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_daily_sales: Option<Decimal>,
    /// Three-year revenue decline rate across the brand's stores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_rate_3yr: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_policy: Option<ExitPolicyDefaults>,
}

/// Brand economics with every default applied exactly once. All downstream
/// computation consumes this, never the raw profile, so fallback values
/// cannot drift between call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBrandProfile {
    pub avg_price: Money,
    pub cogs_rate: Rate,
    pub labor_rate: Rate,
    pub utilities_rate: Rate,
    pub royalty_rate: Rate,
    pub marketing_rate: Rate,
    pub etc_fixed_cost: Money,
    pub owner_working_discount: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_monthly_sales: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_daily_sales: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_rate_3yr: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_penalty: Option<Money>,
    pub contract_term_months: u32,
    pub interior_cost_ratio: Rate,
    pub curve_key: String,
}

impl BrandProfile {
    /// Resolve required fields and defaults into a complete profile.
    /// Fails fast before any computation when a required field is missing
    /// or a supplied rate is out of band.
    pub fn resolve(&self) -> EngineResult<ResolvedBrandProfile> {
        let avg_price = require(self.avg_price, "avg_price")?;
        let cogs_rate = require(self.cogs_rate, "cogs_rate")?;
        let labor_rate = require(self.labor_rate, "labor_rate")?;

        if avg_price <= Decimal::ZERO {
            return Err(EngineError::InvalidInput {
                field: "avg_price".into(),
                reason: "Average ticket price must be positive.".into(),
            });
        }
        for (name, rate) in [
            ("cogs_rate", cogs_rate),
            ("labor_rate", labor_rate),
            ("utilities_rate", self.utilities_rate.unwrap_or(DEFAULT_UTILITIES_RATE)),
            ("royalty_rate", self.royalty_rate.unwrap_or(DEFAULT_ROYALTY_RATE)),
            ("marketing_rate", self.marketing_rate.unwrap_or(DEFAULT_MARKETING_RATE)),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(EngineError::InvalidInput {
                    field: name.into(),
                    reason: format!("Rate {rate} must be within [0, 1)."),
                });
            }
        }
        if let Some(decline) = self.decline_rate_3yr {
            if decline < Decimal::ZERO || decline > Decimal::ONE {
                return Err(EngineError::InvalidInput {
                    field: "decline_rate_3yr".into(),
                    reason: format!("Decline rate {decline} must be within [0, 1]."),
                });
            }
        }

        let exit = self.exit_policy.clone().unwrap_or_default();

        Ok(ResolvedBrandProfile {
            avg_price,
            cogs_rate,
            labor_rate,
            utilities_rate: self.utilities_rate.unwrap_or(DEFAULT_UTILITIES_RATE),
            royalty_rate: self.royalty_rate.unwrap_or(DEFAULT_ROYALTY_RATE),
            marketing_rate: self.marketing_rate.unwrap_or(DEFAULT_MARKETING_RATE),
            etc_fixed_cost: self.etc_fixed_cost.unwrap_or(DEFAULT_ETC_FIXED_COST),
            owner_working_discount: self
                .owner_working_discount
                .unwrap_or(DEFAULT_OWNER_WORKING_DISCOUNT),
            avg_monthly_sales: self.avg_monthly_sales,
            default_daily_sales: self.default_daily_sales,
            decline_rate_3yr: self.decline_rate_3yr,
            fixed_penalty: exit.fixed_penalty,
            contract_term_months: exit
                .contract_term_months
                .unwrap_or(DEFAULT_CONTRACT_TERM_MONTHS),
            interior_cost_ratio: exit
                .interior_cost_ratio
                .unwrap_or(DEFAULT_INTERIOR_COST_RATIO),
            curve_key: exit.curve.unwrap_or_else(|| DEFAULT_CURVE_KEY.to_string()),
        })
    }
}

fn require(value: Option<Decimal>, field: &str) -> EngineResult<Decimal> {
    value.ok_or_else(|| EngineError::MissingBrandDefault {
        field: field.to_string(),
        reason: "Required brand field has no value and no default.".to_string(),
    })
}

/// Validate site-level inputs shared by every engine entry point.
pub fn validate_site(site: &SiteConditions) -> EngineResult<()> {
    if site.initial_investment <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "initial_investment".into(),
            reason: "Initial investment must be positive.".into(),
        });
    }
    if site.monthly_rent < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "monthly_rent".into(),
            reason: "Monthly rent cannot be negative.".into(),
        });
    }
    if site.area_size < Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "area_size".into(),
            reason: "Area size cannot be negative.".into(),
        });
    }
    Ok(())
}
