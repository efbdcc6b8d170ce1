//! Shooting search over period-1 price guesses.
//!
//! Every guess is simulated independently and scored by how far its terminal
//! price ends up from q*. The winner is picked by an explicit reduction once
//! all candidates are in: minimum score, ties going to the lowest grid index.
//! Sequential and parallel runs therefore select the same candidate.

use crate::config::ShootingConfig;
use crate::error::{InvalidTrajectory, ShootingError};
use crate::grid::GuessGrid;
use crate::steady_state::SteadyState;
use crate::trajectory::{ImpulseResponse, Trajectory, TrajectorySimulator};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

/// |1 - q_T / q*|
pub fn convergence_score(terminal_price: f64, steady_price: f64) -> f64 {
    (1.0 - terminal_price / steady_price).abs()
}

/// Result of simulating one grid candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOutcome {
    pub index: usize,
    pub guess: f64,
    pub result: Result<ScoredTrajectory, InvalidTrajectory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrajectory {
    pub trajectory: Trajectory,
    pub score: f64,
}

/// Why a candidate was excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub index: usize,
    pub guess: f64,
    /// Period whose solve failed; `None` when the path completed but could not be scored.
    pub period: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDiagnostics {
    pub candidates: usize,
    pub valid: usize,
    /// Sorted by grid index.
    pub failures: Vec<CandidateFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub trajectory: Trajectory,
    pub guess: f64,
    /// Position of the winning guess in the grid.
    pub index: usize,
    pub score: f64,
    pub steady_state: SteadyState,
    pub diagnostics: SearchDiagnostics,
}

impl SearchResult {
    pub fn terminal_price(&self) -> f64 {
        self.trajectory.terminal_price()
    }

    /// Winning guess relative to q*.
    pub fn relative_guess(&self) -> f64 {
        self.guess / self.steady_state.price
    }

    pub fn impulse_response(&self) -> ImpulseResponse {
        self.trajectory.relative_to(&self.steady_state)
    }
}

/// Picks the valid candidate with the smallest score; equal scores go to the
/// lower grid index regardless of the order `outcomes` arrive in.
pub fn select_best(
    steady_state: &SteadyState,
    outcomes: Vec<CandidateOutcome>,
) -> Result<SearchResult, ShootingError> {
    let candidates = outcomes.len();
    let mut failures = Vec::new();
    let mut first_failure: Option<(usize, InvalidTrajectory)> = None;
    let mut best: Option<(usize, f64, ScoredTrajectory)> = None;
    let mut valid = 0usize;

    for outcome in outcomes {
        match outcome.result {
            Ok(scored) if scored.score.is_finite() => {
                valid += 1;
                let better = match &best {
                    None => true,
                    Some((idx, _, current)) => {
                        scored.score < current.score
                            || (scored.score == current.score && outcome.index < *idx)
                    }
                };
                if better {
                    best = Some((outcome.index, outcome.guess, scored));
                }
            }
            Ok(scored) => {
                debug!(
                    index = outcome.index,
                    guess = outcome.guess,
                    score = scored.score,
                    "candidate has a non-finite score"
                );
                failures.push(CandidateFailure {
                    index: outcome.index,
                    guess: outcome.guess,
                    period: None,
                    reason: format!("non-finite convergence score {}", scored.score),
                });
            }
            Err(invalid) => {
                debug!(
                    index = outcome.index,
                    guess = outcome.guess,
                    period = invalid.period,
                    cause = %invalid.source,
                    "candidate trajectory is invalid"
                );
                failures.push(CandidateFailure {
                    index: outcome.index,
                    guess: outcome.guess,
                    period: Some(invalid.period),
                    reason: invalid.source.to_string(),
                });
                if first_failure.as_ref().map_or(true, |(idx, _)| outcome.index < *idx) {
                    first_failure = Some((outcome.index, invalid));
                }
            }
        }
    }
    failures.sort_by_key(|f| f.index);

    let Some((index, guess, scored)) = best else {
        warn!(candidates, "every candidate guess failed");
        return Err(ShootingError::SearchExhausted {
            candidates,
            first_failure: first_failure.map(|(_, invalid)| invalid),
        });
    };

    info!(
        index,
        guess,
        relative_guess = guess / steady_state.price,
        score = scored.score,
        valid,
        invalid = failures.len(),
        "selected shooting candidate"
    );

    Ok(SearchResult {
        trajectory: scored.trajectory,
        guess,
        index,
        score: scored.score,
        steady_state: *steady_state,
        diagnostics: SearchDiagnostics {
            candidates,
            valid,
            failures,
        },
    })
}

/// A configured shooting run: steady state, shock path and guess grid are
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct ShootingSearch {
    config: ShootingConfig,
    simulator: TrajectorySimulator,
    grid: GuessGrid,
}

impl ShootingSearch {
    pub fn new(config: ShootingConfig) -> Result<Self, ShootingError> {
        config.validate()?;
        let steady_state = SteadyState::compute(&config.parameters)?;
        let shocks = config.shock.build(config.horizon, &config.parameters)?;
        let grid = GuessGrid::around(steady_state.price, &config.grid)?;
        let simulator =
            TrajectorySimulator::new(config.parameters, steady_state, shocks, config.newton)?;
        Ok(Self {
            config,
            simulator,
            grid,
        })
    }

    pub fn config(&self) -> &ShootingConfig {
        &self.config
    }

    pub fn steady_state(&self) -> &SteadyState {
        self.simulator.steady_state()
    }

    pub fn grid(&self) -> &GuessGrid {
        &self.grid
    }

    pub fn simulator(&self) -> &TrajectorySimulator {
        &self.simulator
    }

    /// Simulates and scores the candidate at `index`, or `None` past the grid.
    pub fn evaluate(&self, index: usize) -> Option<CandidateOutcome> {
        let guess = self.grid.get(index)?;
        let steady_price = self.steady_state().price;
        let result = self.simulator.simulate(guess).map(|trajectory| ScoredTrajectory {
            score: convergence_score(trajectory.terminal_price(), steady_price),
            trajectory,
        });
        Some(CandidateOutcome {
            index,
            guess,
            result,
        })
    }

    /// Evaluates the whole grid (in parallel with the `parallel` feature) and
    /// selects the winner.
    pub fn run(&self) -> Result<SearchResult, ShootingError> {
        let span = info_span!("shooting_search", candidates = self.grid.len());
        let _enter = span.enter();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<CandidateOutcome> = (0..self.grid.len())
            .into_par_iter()
            .filter_map(|index| self.evaluate(index))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes = self.evaluate_in_order();

        select_best(self.steady_state(), outcomes)
    }

    /// Single-threaded run.
    pub fn run_sequential(&self) -> Result<SearchResult, ShootingError> {
        let span = info_span!("shooting_search", candidates = self.grid.len(), sequential = true);
        let _enter = span.enter();
        select_best(self.steady_state(), self.evaluate_in_order())
    }

    fn evaluate_in_order(&self) -> Vec<CandidateOutcome> {
        (0..self.grid.len())
            .filter_map(|index| self.evaluate(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use crate::grid::GridSettings;
    use crate::newton::NewtonSettings;
    use crate::shock::ShockSpec;

    fn reference_result() -> SearchResult {
        ShootingSearch::new(ShootingConfig::default())
            .expect("search")
            .run()
            .expect("winner")
    }

    fn outcome(index: usize, score: f64) -> CandidateOutcome {
        CandidateOutcome {
            index,
            guess: 50.0 + index as f64,
            result: Ok(ScoredTrajectory {
                trajectory: Trajectory {
                    guess: 50.0 + index as f64,
                    price: vec![50.0, 50.0 + index as f64],
                    landholding: vec![6.0, 6.0],
                    debt: vec![300.0, 300.0],
                    max_iterations: 0,
                },
                score,
            }),
        }
    }

    fn failed(index: usize) -> CandidateOutcome {
        CandidateOutcome {
            index,
            guess: 50.0 + index as f64,
            result: Err(InvalidTrajectory {
                guess: 50.0 + index as f64,
                period: 3,
                source: StepError::SingularJacobian,
            }),
        }
    }

    fn steady() -> SteadyState {
        SteadyState {
            price: 50.0,
            landholding: 6.0,
            debt: 300.0,
            downpayment_offset: 5.0,
        }
    }

    #[test]
    fn reference_run_converges_inside_the_grid() {
        let result = reference_result();
        let grid_lower = result.steady_state.price * (1.0037 - 0.0005);
        let grid_upper = result.steady_state.price * (1.0037 + 0.0005);

        assert!(result.guess > grid_lower && result.guess < grid_upper, "guess {}", result.guess);
        assert!(result.index > 0 && result.index < 999);
        assert!(result.score < 1e-6, "score {}", result.score);
        assert_eq!(result.diagnostics.candidates, 1000);
        assert_eq!(result.diagnostics.valid, 1000);
        assert!(result.diagnostics.failures.is_empty());
        assert_eq!(result.trajectory.price.len(), 101);
        assert_eq!(result.trajectory.price[1], result.guess);
        // The price jumps on impact and ends back at the steady state.
        assert!((result.relative_guess() - 1.004).abs() < 5e-4);
        assert!((result.terminal_price() / result.steady_state.price - 1.0).abs() < 1e-6);
    }

    #[test]
    fn winner_is_minimal_among_all_candidates() {
        let config = ShootingConfig {
            grid: GridSettings {
                count: 120,
                ..GridSettings::default()
            },
            ..ShootingConfig::default()
        };
        let search = ShootingSearch::new(config).expect("search");
        let result = search.run().expect("winner");

        for index in 0..search.grid().len() {
            let candidate = search.evaluate(index).expect("in grid");
            let scored = candidate.result.expect("valid");
            assert!(result.score <= scored.score, "candidate {index} beats the winner");
        }
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let config = ShootingConfig {
            grid: GridSettings {
                count: 200,
                ..GridSettings::default()
            },
            ..ShootingConfig::default()
        };
        let search = ShootingSearch::new(config.clone()).expect("search");
        let first = search.run().expect("winner");
        let second = ShootingSearch::new(config).expect("search").run().expect("winner");
        assert_eq!(first, second);
        assert_eq!(first.score.to_bits(), second.score.to_bits());
    }

    #[test]
    fn sequential_and_default_runs_agree() {
        let config = ShootingConfig {
            grid: GridSettings {
                count: 150,
                ..GridSettings::default()
            },
            ..ShootingConfig::default()
        };
        let search = ShootingSearch::new(config).expect("search");
        assert_eq!(search.run().expect("run"), search.run_sequential().expect("run"));
    }

    #[test]
    fn quiet_economy_selects_the_steady_state() {
        let config = ShootingConfig {
            shock: ShockSpec::None,
            grid: GridSettings {
                count: 201,
                center: 1.0,
                half_width: 0.0005,
            },
            ..ShootingConfig::default()
        };
        let result = ShootingSearch::new(config).expect("search").run().expect("winner");
        let ss = result.steady_state;

        assert_eq!(result.index, 100);
        assert!((result.guess / ss.price - 1.0).abs() < 1e-12);
        assert!(result.score < 1e-12);
        let irf = result.impulse_response();
        for series in [&irf.price, &irf.landholding, &irf.debt] {
            assert!(series.iter().all(|v| (v - 1.0).abs() < 1e-9));
        }
    }

    #[test]
    fn exhausted_search_is_an_error() {
        let config = ShootingConfig {
            grid: GridSettings {
                count: 20,
                ..GridSettings::default()
            },
            newton: NewtonSettings {
                max_steps: 1,
                ..NewtonSettings::default()
            },
            ..ShootingConfig::default()
        };
        let err = ShootingSearch::new(config).expect("search").run().expect_err("no winner");
        match err {
            ShootingError::SearchExhausted {
                candidates,
                first_failure,
            } => {
                assert_eq!(candidates, 20);
                let first = first_failure.expect("failure recorded");
                assert_eq!(first.period, 1);
                assert!(matches!(first.source, StepError::NonConvergence { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn domain_errors_stop_the_run_before_searching() {
        let mut config = ShootingConfig::default();
        config.parameters.interest_factor = 1.0;
        assert!(matches!(
            ShootingSearch::new(config),
            Err(ShootingError::Domain(_))
        ));
    }

    #[test]
    fn ties_go_to_the_lowest_index_in_any_order() {
        let outcomes = vec![outcome(7, 0.5), outcome(3, 0.1), failed(0), outcome(5, 0.1)];
        let result = select_best(&steady(), outcomes).expect("winner");
        assert_eq!(result.index, 3);
        assert_eq!(result.guess, 53.0);
        assert_eq!(result.diagnostics.valid, 3);
        assert_eq!(result.diagnostics.failures.len(), 1);
        assert_eq!(result.diagnostics.failures[0].period, Some(3));
    }

    #[test]
    fn invalid_candidates_are_skipped_not_fatal() {
        let outcomes = vec![failed(0), failed(1), outcome(2, 0.3), failed(4)];
        let result = select_best(&steady(), outcomes).expect("winner");
        assert_eq!(result.index, 2);
        let indices: Vec<usize> = result.diagnostics.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 4]);
    }

    #[test]
    fn non_finite_scores_are_excluded() {
        let outcomes = vec![outcome(0, f64::NAN), outcome(1, 0.2)];
        let result = select_best(&steady(), outcomes).expect("winner");
        assert_eq!(result.index, 1);
        assert_eq!(result.diagnostics.failures[0].period, None);
    }

    #[test]
    fn all_failed_reports_lowest_index_failure() {
        let err = select_best(&steady(), vec![failed(4), failed(2)]).expect_err("exhausted");
        match err {
            ShootingError::SearchExhausted {
                candidates,
                first_failure,
            } => {
                assert_eq!(candidates, 2);
                assert_eq!(first_failure.expect("failure").guess, 52.0);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn score_is_absolute_relative_deviation() {
        assert_eq!(convergence_score(50.0, 50.0), 0.0);
        assert!((convergence_score(49.0, 50.0) - 0.02).abs() < 1e-15);
        assert!((convergence_score(51.0, 50.0) - 0.02).abs() < 1e-15);
    }
}
