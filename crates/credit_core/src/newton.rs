//! Damped Newton iteration for small square systems.

use crate::autodiff::{jacobian, Dual};
use crate::error::{ShootingError, StepError};
use crate::traits::ResidualSystem;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub damping: f64,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            damping: 1.0,
            tolerance: 1e-10,
        }
    }
}

impl NewtonSettings {
    pub fn validate(&self) -> Result<(), ShootingError> {
        if self.max_steps == 0 {
            return Err(ShootingError::InvalidConfig(
                "max_steps must be greater than zero.".into(),
            ));
        }
        if !(self.damping.is_finite() && self.damping > 0.0) {
            return Err(ShootingError::InvalidConfig("damping must be positive.".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ShootingError::InvalidConfig(
                "tolerance must be positive.".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewtonOutcome {
    pub state: Vec<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
}

pub fn solve_newton<S>(
    system: &S,
    initial_guess: &[f64],
    settings: &NewtonSettings,
) -> Result<NewtonOutcome, StepError>
where
    S: ResidualSystem<f64> + ResidualSystem<Dual>,
{
    let dim = ResidualSystem::<f64>::dimension(system);
    if initial_guess.len() != dim {
        return Err(StepError::DimensionMismatch {
            expected: dim,
            got: initial_guess.len(),
        });
    }

    let mut state = initial_guess.to_vec();
    let mut residual = vec![0.0; dim];
    let mut residual_norm = evaluate(system, &state, &mut residual, 0)?;
    let mut iterations = 0usize;

    loop {
        if residual_norm <= settings.tolerance {
            break;
        }

        if iterations >= settings.max_steps {
            return Err(StepError::NonConvergence {
                steps: settings.max_steps,
                residual_norm,
            });
        }

        let jac = jacobian(system, &state);
        let delta = solve_linear_system(dim, &jac, &residual)?;

        for i in 0..dim {
            state[i] -= settings.damping * delta[i];
        }

        iterations += 1;
        residual_norm = evaluate(system, &state, &mut residual, iterations)?;
    }

    Ok(NewtonOutcome {
        state,
        residual_norm,
        iterations,
    })
}

fn evaluate<S: ResidualSystem<f64>>(
    system: &S,
    state: &[f64],
    out: &mut [f64],
    iteration: usize,
) -> Result<f64, StepError> {
    if state.iter().any(|v| !v.is_finite()) {
        return Err(StepError::NonFinite { iteration });
    }
    system.check_domain(state)?;
    system.residual(state, out);
    let norm = l2_norm(out);
    if !norm.is_finite() {
        return Err(StepError::NonFinite { iteration });
    }
    Ok(norm)
}

fn solve_linear_system(dim: usize, jacobian: &[f64], residual: &[f64]) -> Result<Vec<f64>, StepError> {
    let j_matrix = DMatrix::from_row_slice(dim, dim, jacobian);
    let rhs = DVector::from_column_slice(residual);
    j_matrix
        .lu()
        .solve(&rhs)
        .map(|v| v.iter().cloned().collect())
        .ok_or(StepError::SingularJacobian)
}

pub(crate) fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
