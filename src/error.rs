//! Crate-wide error type for trajectory resolution failures.

use thiserror::Error;

/// Failure kinds produced by the resolvers in this crate.
///
/// Every variant carries the parameter `t` or waypoint index at which the
/// failure occurred, so a caller can build the diagnostic message the
/// top-level entry points collapse to `None` + a logged `tracing::warn!`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("invalid constraint list: {0}")]
    InvalidConstraint(String),

    #[error("start configuration unreachable at t=0 (residual {residual})")]
    StartUnreachable { residual: f64 },

    #[error("end configuration unreachable at t=1 (residual {residual})")]
    EndUnreachable { residual: f64 },

    #[error("endpoint configuration is infeasible")]
    InfeasibleEndpoint,

    #[error("step stalled at t={t}, stepsize shrank below parameter-stall tolerance")]
    StepStall { t: f64 },

    #[error("feasibility test rejected configuration at t={t}")]
    Infeasible { t: f64 },

    #[error("bisection could not solve the midpoint at u={u}")]
    BisectIkFail { u: f64 },

    #[error(
        "excessive growth at u={u}: d0={d0:.6} d1={d1:.6} d2={d2:.6} (possible self-motion discontinuity)"
    )]
    ExcessiveGrowth { u: f64, d0: f64, d1: f64, d2: f64 },

    #[error("sample budget of {budget} exhausted without connecting the path")]
    SampleBudgetExhausted { budget: usize },
}

/// Result alias used internally by the typed `_checked` entry points.
pub type ResolveResult<T> = Result<T, ResolveError>;
