//! Plot-ready payloads handed to the JavaScript front end.

use credit_core::search::{convergence_score, SearchDiagnostics, SearchResult};
use credit_core::{SteadyState, Trajectory};
use serde::{Deserialize, Serialize};

/// One transition path, raw and normalised by the steady state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryReport {
    pub time: Vec<f64>,
    pub price: Vec<f64>,
    pub landholding: Vec<f64>,
    pub debt: Vec<f64>,
    pub price_ratio: Vec<f64>,
    pub landholding_ratio: Vec<f64>,
    pub debt_ratio: Vec<f64>,
    pub guess: f64,
    pub relative_guess: f64,
    pub score: f64,
}

impl TrajectoryReport {
    pub fn new(trajectory: &Trajectory, steady_state: &SteadyState) -> Self {
        let irf = trajectory.relative_to(steady_state);
        Self {
            time: (0..trajectory.price.len()).map(|t| t as f64).collect(),
            price: trajectory.price.clone(),
            landholding: trajectory.landholding.clone(),
            debt: trajectory.debt.clone(),
            price_ratio: irf.price,
            landholding_ratio: irf.landholding,
            debt_ratio: irf.debt,
            guess: trajectory.guess,
            relative_guess: trajectory.guess / steady_state.price,
            score: convergence_score(trajectory.terminal_price(), steady_state.price),
        }
    }
}

/// The selected path plus search diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub trajectory: TrajectoryReport,
    pub index: usize,
    pub steady_state: SteadyState,
    pub diagnostics: SearchDiagnostics,
}

impl From<&SearchResult> for SearchReport {
    fn from(result: &SearchResult) -> Self {
        Self {
            trajectory: TrajectoryReport::new(&result.trajectory, &result.steady_state),
            index: result.index,
            steady_state: result.steady_state,
            diagnostics: result.diagnostics.clone(),
        }
    }
}
