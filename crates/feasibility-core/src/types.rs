use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Scores on a 0–100 scale.
pub type Score = Decimal;

/// How a loan is repaid. Serialized form matches the engine's JSON contract
/// (`equal_payment` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentStyle {
    EqualPayment,
    EqualPrincipal,
    InterestOnly,
}

impl RepaymentStyle {
    /// Parse a dynamic style string, for callers that receive loan data as
    /// loosely-typed JSON rather than through serde.
    pub fn parse(s: &str) -> Result<Self, crate::EngineError> {
        match s {
            "equal_payment" => Ok(Self::EqualPayment),
            "equal_principal" => Ok(Self::EqualPrincipal),
            "interest_only" => Ok(Self::InterestOnly),
            other => Err(crate::EngineError::UnsupportedRepaymentStyle(
                other.to_string(),
            )),
        }
    }
}

/// A single loan attached to the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub principal: Money,
    /// Annual rate in [0, 1).
    pub annual_rate: Rate,
    pub term_months: u32,
    pub repayment_style: RepaymentStyle,
}

/// Physical and contractual conditions of the candidate site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConditions {
    pub initial_investment: Money,
    pub monthly_rent: Money,
    /// Floor area in the unit the demolition per-area cost is quoted in.
    pub area_size: Decimal,
    pub owner_working: bool,
    #[serde(default)]
    pub loans: Vec<Loan>,
    /// Key money (recoverable deposit / goodwill paid on entry).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_money: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demolition_base_cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demolition_per_area_cost: Option<Money>,
}

/// Market-analysis snapshot for the neighbourhood. Produced upstream;
/// the engine treats the score as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Daily unit sales the market data suggests for this category/site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_daily_sales: Option<Decimal>,
    /// 0–100, higher is a stronger market.
    pub market_score: Score,
}

/// Street-level site assessment. 0–100, higher is safer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadviewAssessment {
    pub risk_score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_risk: Option<String>,
}

/// Traffic-light verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Green,
    Yellow,
    Red,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        };
        write!(f, "{}", s)
    }
}

/// Severity of a risk finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Engine configuration. Strictness is a deliberate caller choice, not an
/// ambient environment check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// When true, the internal output-schema self-check fails hard instead
    /// of logging a warning.
    pub strict_validation: bool,
    /// Exit-plan horizon in months.
    pub exit_horizon_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_validation: true,
            exit_horizon_months: 36,
        }
    }
}

/// Standard computation output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Clamp a score to the 0–100 band.
pub fn clamp_score(value: Decimal) -> Score {
    value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
