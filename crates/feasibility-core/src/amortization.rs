use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{EngineError, EngineResult, types::*};

/// Months of schedule preview generated per loan and combined.
pub const PREVIEW_MONTHS: u32 = 12;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// One month of a repayment schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMonth {
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Schedule preview for a single loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSchedule {
    /// Representative monthly payment. For equal-principal loans this is
    /// the first month's total, the highest the borrower will face.
    pub monthly_payment: Money,
    pub monthly_interest: Money,
    pub monthly_principal: Money,
    pub months: Vec<ScheduleMonth>,
}

/// Combined amortization view across all loans on the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationResult {
    pub total_monthly_payment: Money,
    pub total_monthly_interest: Money,
    pub total_monthly_principal: Money,
    pub per_loan: Vec<LoanSchedule>,
    pub combined: Vec<ScheduleMonth>,
}

impl AmortizationResult {
    /// Result for a site with no debt at all.
    pub fn empty() -> Self {
        Self {
            total_monthly_payment: Decimal::ZERO,
            total_monthly_interest: Decimal::ZERO,
            total_monthly_principal: Decimal::ZERO,
            per_loan: Vec::new(),
            combined: Vec::new(),
        }
    }

    pub fn has_debt(&self) -> bool {
        self.total_monthly_payment > Decimal::ZERO
    }
}

/// Validate every loan, aggregating all violations into one error so the
/// caller can surface the full list in a single round trip.
pub fn validate_loans(loans: &[Loan]) -> EngineResult<()> {
    let mut violations = Vec::new();
    for (i, loan) in loans.iter().enumerate() {
        if loan.principal <= Decimal::ZERO {
            violations.push(format!("loan[{i}]: principal {} must be positive", loan.principal));
        }
        if loan.annual_rate < Decimal::ZERO || loan.annual_rate >= Decimal::ONE {
            violations.push(format!(
                "loan[{i}]: annual rate {} must be within [0, 1)",
                loan.annual_rate
            ));
        }
        if loan.term_months == 0 {
            violations.push(format!("loan[{i}]: term must be a positive number of months"));
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidLoanInput { violations })
    }
}

/// Amortize a set of loans into per-loan schedules and a combined
/// 12-month preview. Loans must already pass `validate_loans`.
pub fn amortize(loans: &[Loan]) -> EngineResult<AmortizationResult> {
    validate_loans(loans)?;

    if loans.is_empty() {
        return Ok(AmortizationResult::empty());
    }

    let per_loan: Vec<LoanSchedule> = loans.iter().map(schedule_for).collect();

    let mut combined = Vec::with_capacity(PREVIEW_MONTHS as usize);
    for m in 0..PREVIEW_MONTHS as usize {
        let mut payment = Decimal::ZERO;
        let mut interest = Decimal::ZERO;
        let mut principal = Decimal::ZERO;
        let mut balance = Decimal::ZERO;
        for schedule in &per_loan {
            if let Some(row) = schedule.months.get(m) {
                payment += row.payment;
                interest += row.interest;
                principal += row.principal;
                balance += row.remaining_balance;
            }
        }
        combined.push(ScheduleMonth {
            month: m as u32 + 1,
            payment,
            interest,
            principal,
            remaining_balance: balance,
        });
    }

    Ok(AmortizationResult {
        total_monthly_payment: per_loan.iter().map(|s| s.monthly_payment).sum(),
        total_monthly_interest: per_loan.iter().map(|s| s.monthly_interest).sum(),
        total_monthly_principal: per_loan.iter().map(|s| s.monthly_principal).sum(),
        per_loan,
        combined,
    })
}

fn schedule_for(loan: &Loan) -> LoanSchedule {
    let monthly_rate = loan.annual_rate / MONTHS_PER_YEAR;
    let preview = PREVIEW_MONTHS.min(loan.term_months);

    match loan.repayment_style {
        RepaymentStyle::EqualPayment => {
            let payment = annuity_payment(loan.principal, monthly_rate, loan.term_months);
            let mut months = Vec::with_capacity(preview as usize);
            let mut balance = loan.principal;
            for m in 1..=preview {
                let interest = balance * monthly_rate;
                let principal_part = payment - interest;
                balance -= principal_part;
                months.push(ScheduleMonth {
                    month: m,
                    payment,
                    interest,
                    principal: principal_part,
                    remaining_balance: balance,
                });
            }
            let first = &months[0];
            LoanSchedule {
                monthly_payment: payment,
                monthly_interest: first.interest,
                monthly_principal: first.principal,
                months,
            }
        }
        RepaymentStyle::EqualPrincipal => {
            let principal_part = loan.principal / Decimal::from(loan.term_months);
            let mut months = Vec::with_capacity(preview as usize);
            let mut balance = loan.principal;
            for m in 1..=preview {
                let interest = balance * monthly_rate;
                balance -= principal_part;
                months.push(ScheduleMonth {
                    month: m,
                    payment: principal_part + interest,
                    interest,
                    principal: principal_part,
                    remaining_balance: balance,
                });
            }
            let first = &months[0];
            LoanSchedule {
                monthly_payment: first.payment,
                monthly_interest: first.interest,
                monthly_principal: principal_part,
                months,
            }
        }
        RepaymentStyle::InterestOnly => {
            let interest = loan.principal * monthly_rate;
            let months = (1..=preview)
                .map(|m| ScheduleMonth {
                    month: m,
                    payment: interest,
                    interest,
                    principal: Decimal::ZERO,
                    remaining_balance: loan.principal,
                })
                .collect();
            LoanSchedule {
                monthly_payment: interest,
                monthly_interest: interest,
                monthly_principal: Decimal::ZERO,
                months,
            }
        }
    }
}

/// Standard annuity payment: P·r·(1+r)^n / ((1+r)^n − 1), or P/n at r=0.
fn annuity_payment(principal: Money, monthly_rate: Rate, term_months: u32) -> Money {
    let n = Decimal::from(term_months);
    if monthly_rate.is_zero() {
        return principal / n;
    }
    let factor = (Decimal::ONE + monthly_rate).powd(n);
    principal * monthly_rate * factor / (factor - Decimal::ONE)
}

/// Pure memo for amortization results. Identical loan sets recur heavily
/// during sensitivity and improvement-simulation passes.
#[derive(Debug, Default)]
pub struct AmortizationCache {
    entries: HashMap<Vec<Loan>, AmortizationResult>,
}

impl AmortizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, loans: &[Loan]) -> EngineResult<AmortizationResult> {
        if let Some(hit) = self.entries.get(loans) {
            return Ok(hit.clone());
        }
        let result = amortize(loans)?;
        self.entries.insert(loans.to_vec(), result.clone());
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
