//! Financial and decision engine for franchise-cafe feasibility studies.
//!
//! The engine turns brand economics, site conditions, and a target sales
//! volume into a profit/loss projection, a 0–100 viability score, a
//! traffic-light verdict, a survival estimate, and an optimal-exit plan.
//! It is pure and synchronous: identical inputs always produce identical
//! outputs, and every failure is a typed error returned to the caller.

pub mod amortization;
pub mod brand;
pub mod decision;
pub mod error;
pub mod exit_plan;
pub mod finance;
pub mod improvement;
pub mod risk;
pub mod scoring;
pub mod survival;
pub mod types;

pub use error::EngineError;
pub use types::*;

/// Standard result type for all engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
