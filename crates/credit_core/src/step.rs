//! One-period solve of the land market, landholding and debt equations.
//!
//! Given (K_{t-1}, B_{t-1}), the current price q_t and shock Δ_t, the unknowns
//! x = (q_{t+1}, K_t, B_t) satisfy
//!
//! ```text
//! q_{t+1} = R (q_t - (K_t - ν))
//! K_t     = (1-π) λ K_{t-1} + π / (ϕ + q_t - q_{t+1}/R) · ((a + Δ_t + q_t + λϕ) K_{t-1} - R B_{t-1})
//! B_t     = R B_{t-1} + q_t (K_t - K_{t-1}) + ϕ (K_t - λ K_{t-1}) - (a + Δ_t) K_{t-1}
//! ```
//!
//! q_{t+1} enters the landholding equation through its denominator, so the
//! three equations are solved jointly with Newton's method.

use crate::error::StepError;
use crate::newton::{l2_norm, solve_newton, NewtonSettings};
use crate::params::StructuralParameters;
use crate::steady_state::SteadyState;
use crate::traits::{ResidualSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Relative size below which the land-demand denominator counts as zero.
const SINGULARITY_EPSILON: f64 = 1e-10;

/// Known quantities entering period t.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodInputs {
    pub prev_landholding: f64,
    pub prev_debt: f64,
    pub price: f64,
    pub shock: f64,
}

/// Solved (q_{t+1}, K_t, B_t).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodSolution {
    pub next_price: f64,
    pub landholding: f64,
    pub debt: f64,
    pub iterations: usize,
    pub residual_norm: f64,
}

struct PeriodSystem<'a> {
    params: &'a StructuralParameters,
    downpayment_offset: f64,
    inputs: PeriodInputs,
}

impl PeriodSystem<'_> {
    fn denominator(&self, next_price: f64) -> f64 {
        self.params.trees_per_fruit + self.inputs.price - next_price / self.params.interest_factor
    }
}

impl<T: Scalar> ResidualSystem<T> for PeriodSystem<'_> {
    fn dimension(&self) -> usize {
        3
    }

    fn residual(&self, x: &[T], out: &mut [T]) {
        let p = self.params;
        let r = T::lift(p.interest_factor);
        let lambda = T::lift(p.survival_rate);
        let pi = T::lift(p.reallocation_probability);
        let phi = T::lift(p.trees_per_fruit);
        let nu = T::lift(self.downpayment_offset);
        let yield_t = T::lift(p.productivity + self.inputs.shock);
        let q = T::lift(self.inputs.price);
        let k_prev = T::lift(self.inputs.prev_landholding);
        let b_prev = T::lift(self.inputs.prev_debt);

        let (q_next, k, b) = (x[0], x[1], x[2]);

        let net_worth = (yield_t + q + lambda * phi) * k_prev - r * b_prev;
        let user_cost = phi + q - q_next / r;

        out[0] = q_next - r * q + r * (k - nu);
        out[1] = k - (T::one() - pi) * lambda * k_prev - pi / user_cost * net_worth;
        out[2] = b - r * b_prev - q * (k - k_prev) - phi * (k - lambda * k_prev) + yield_t * k_prev;
    }

    fn check_domain(&self, x: &[f64]) -> Result<(), StepError> {
        let denominator = self.denominator(x[0]);
        let scale = self.params.trees_per_fruit.abs() + self.inputs.price.abs();
        if !denominator.is_finite() || denominator.abs() <= SINGULARITY_EPSILON * scale {
            return Err(StepError::Singularity { denominator });
        }
        Ok(())
    }
}

/// Advances the state by one period.
#[derive(Debug, Clone, Copy)]
pub struct PeriodStepSolver {
    params: StructuralParameters,
    downpayment_offset: f64,
    settings: NewtonSettings,
}

impl PeriodStepSolver {
    pub fn new(
        params: StructuralParameters,
        steady_state: &SteadyState,
        settings: NewtonSettings,
    ) -> Self {
        Self {
            params,
            downpayment_offset: steady_state.downpayment_offset,
            settings,
        }
    }

    fn system(&self, inputs: PeriodInputs) -> PeriodSystem<'_> {
        PeriodSystem {
            params: &self.params,
            downpayment_offset: self.downpayment_offset,
            inputs,
        }
    }

    /// Solves for (q_{t+1}, K_t, B_t) starting Newton from `initial_guess`.
    pub fn solve(
        &self,
        inputs: PeriodInputs,
        initial_guess: [f64; 3],
    ) -> Result<PeriodSolution, StepError> {
        let outcome = solve_newton(&self.system(inputs), &initial_guess, &self.settings)?;
        Ok(PeriodSolution {
            next_price: outcome.state[0],
            landholding: outcome.state[1],
            debt: outcome.state[2],
            iterations: outcome.iterations,
            residual_norm: outcome.residual_norm,
        })
    }

    /// Residuals of the three equations at `candidate` = (q_{t+1}, K_t, B_t).
    pub fn residuals(&self, inputs: PeriodInputs, candidate: [f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        ResidualSystem::<f64>::residual(&self.system(inputs), &candidate, &mut out);
        out
    }

    pub fn residual_norm(&self, inputs: PeriodInputs, candidate: [f64; 3]) -> f64 {
        l2_norm(&self.residuals(inputs, candidate))
    }
}
