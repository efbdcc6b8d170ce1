//! Forward simulation of a transition path from a period-1 price guess.

use crate::error::{InvalidTrajectory, ShootingError};
use crate::newton::NewtonSettings;
use crate::params::StructuralParameters;
use crate::shock::ShockSchedule;
use crate::steady_state::SteadyState;
use crate::step::{PeriodInputs, PeriodStepSolver};
use serde::{Deserialize, Serialize};

/// (q_t, K_t, B_t) for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodState {
    pub price: f64,
    pub landholding: f64,
    pub debt: f64,
}

/// Aligned price, landholding and debt sequences over periods 0..=T.
///
/// The last period has no forward solve, so K_T and B_T repeat K_{T-1} and
/// B_{T-1}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub guess: f64,
    pub price: Vec<f64>,
    pub landholding: Vec<f64>,
    pub debt: Vec<f64>,
    /// Largest Newton iteration count over all periods.
    pub max_iterations: usize,
}

impl Trajectory {
    pub fn horizon(&self) -> usize {
        self.price.len().saturating_sub(1)
    }

    pub fn terminal_price(&self) -> f64 {
        self.price.last().copied().unwrap_or(f64::NAN)
    }

    pub fn period(&self, t: usize) -> Option<PeriodState> {
        Some(PeriodState {
            price: *self.price.get(t)?,
            landholding: *self.landholding.get(t)?,
            debt: *self.debt.get(t)?,
        })
    }

    /// Impulse responses q_t/q*, K_t/K*, B_t/B*.
    pub fn relative_to(&self, steady_state: &SteadyState) -> ImpulseResponse {
        let ratio = |values: &[f64], level: f64| -> Vec<f64> {
            values.iter().map(|v| v / level).collect()
        };
        ImpulseResponse {
            price: ratio(&self.price, steady_state.price),
            landholding: ratio(&self.landholding, steady_state.landholding),
            debt: ratio(&self.debt, steady_state.debt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpulseResponse {
    pub price: Vec<f64>,
    pub landholding: Vec<f64>,
    pub debt: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TrajectorySimulator {
    steady_state: SteadyState,
    shocks: ShockSchedule,
    step: PeriodStepSolver,
}

impl TrajectorySimulator {
    pub fn new(
        params: StructuralParameters,
        steady_state: SteadyState,
        shocks: ShockSchedule,
        settings: NewtonSettings,
    ) -> Result<Self, ShootingError> {
        if shocks.horizon() < 1 {
            return Err(ShootingError::InvalidConfig(
                "Horizon must cover at least one period after the steady state.".into(),
            ));
        }
        Ok(Self {
            step: PeriodStepSolver::new(params, &steady_state, settings),
            steady_state,
            shocks,
        })
    }

    pub fn horizon(&self) -> usize {
        self.shocks.horizon()
    }

    pub fn steady_state(&self) -> &SteadyState {
        &self.steady_state
    }

    pub fn step_solver(&self) -> &PeriodStepSolver {
        &self.step
    }

    /// Simulates periods 0..=T with q_1 = `guess`.
    pub fn simulate(&self, guess: f64) -> Result<Trajectory, InvalidTrajectory> {
        let horizon = self.horizon();
        let ss = &self.steady_state;

        let mut price = vec![0.0; horizon + 1];
        let mut landholding = vec![0.0; horizon + 1];
        let mut debt = vec![0.0; horizon + 1];
        price[0] = ss.price;
        landholding[0] = ss.landholding;
        debt[0] = ss.debt;
        price[1] = guess;

        let mut max_iterations = 0usize;
        for t in 1..horizon {
            let inputs = PeriodInputs {
                prev_landholding: landholding[t - 1],
                prev_debt: debt[t - 1],
                price: price[t],
                shock: self.shocks.at(t),
            };
            let solution = self
                .step
                .solve(inputs, ss.triple())
                .map_err(|source| InvalidTrajectory {
                    guess,
                    period: t,
                    source,
                })?;
            price[t + 1] = solution.next_price;
            landholding[t] = solution.landholding;
            debt[t] = solution.debt;
            max_iterations = max_iterations.max(solution.iterations);
        }

        landholding[horizon] = landholding[horizon - 1];
        debt[horizon] = debt[horizon - 1];

        Ok(Trajectory {
            guess,
            price,
            landholding,
            debt,
            max_iterations,
        })
    }
}
