//! Error taxonomy.
//!
//! Only [`ShootingError`] is fatal to a run. [`StepError`] and
//! [`InvalidTrajectory`] describe the failure of a single guess and are
//! collected as diagnostics while the search carries on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one period's nonlinear solve.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum StepError {
    #[error("Land-demand denominator degenerated (ϕ + q_t - q_(t+1)/R = {denominator:e}).")]
    Singularity { denominator: f64 },
    #[error("Newton solver failed to converge in {steps} steps (‖f(x)‖ = {residual_norm:e}).")]
    NonConvergence { steps: usize, residual_norm: f64 },
    #[error("Jacobian is singular.")]
    SingularJacobian,
    #[error("Newton iterate became non-finite at iteration {iteration}.")]
    NonFinite { iteration: usize },
    #[error("Initial guess dimension mismatch. Expected {expected}, got {got}.")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A guess whose forward simulation broke down.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("trajectory for guess {guess} failed in period {period}: {source}")]
pub struct InvalidTrajectory {
    pub guess: f64,
    pub period: usize,
    pub source: StepError,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShootingError {
    /// Structural parameters leave the steady state undefined.
    #[error("Steady state is undefined: {0}")]
    Domain(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("All {candidates} candidate guesses produced invalid trajectories.")]
    SearchExhausted {
        candidates: usize,
        first_failure: Option<InvalidTrajectory>,
    },
}

pub type Result<T, E = ShootingError> = std::result::Result<T, E>;
