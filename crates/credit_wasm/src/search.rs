//! Shooting search runners.
//!
//! The browser has no thread pool, so the stepped runner walks the grid in
//! order, a batch per call, and applies the core's selection once every
//! candidate has been evaluated.

use crate::report::SearchReport;
use crate::system::{build_search, serialize, to_js_error};
use credit_core::search::{select_best, CandidateOutcome};
use credit_core::{SearchResult, ShootingSearch};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Runs the whole search in one call.
#[wasm_bindgen]
pub fn run_shooting_search(config: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let search = build_search(config).map_err(to_js_error)?;
    let result = search
        .run_sequential()
        .map_err(|e| JsValue::from_str(&format!("Shooting search failed: {}", e)))?;
    serialize(&SearchReport::from(&result))
}

/// Progress payload for the stepped search runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SearchProgress {
    done: bool,
    evaluated: usize,
    candidates: usize,
    valid: usize,
    best_score: Option<f64>,
}

pub(crate) struct SearchRunnerState {
    search: ShootingSearch,
    outcomes: Vec<CandidateOutcome>,
    best_score: Option<f64>,
    valid: usize,
}

impl SearchRunnerState {
    pub(crate) fn new(search: ShootingSearch) -> Self {
        let capacity = search.grid().len();
        Self {
            search,
            outcomes: Vec::with_capacity(capacity),
            best_score: None,
            valid: 0,
        }
    }

    fn done(&self) -> bool {
        self.outcomes.len() >= self.search.grid().len()
    }

    /// Evaluates up to `batch_size` further candidates in grid order.
    pub(crate) fn advance(&mut self, batch_size: usize) -> SearchProgress {
        for _ in 0..batch_size {
            let Some(outcome) = self.search.evaluate(self.outcomes.len()) else {
                break;
            };
            self.record(outcome);
        }
        self.progress()
    }

    /// Non-finite scores are failures, as in the final selection.
    fn record(&mut self, outcome: CandidateOutcome) {
        if let Ok(scored) = &outcome.result {
            if scored.score.is_finite() {
                self.valid += 1;
                if self.best_score.map_or(true, |best| scored.score < best) {
                    self.best_score = Some(scored.score);
                }
            }
        }
        self.outcomes.push(outcome);
    }

    pub(crate) fn progress(&self) -> SearchProgress {
        SearchProgress {
            done: self.done(),
            evaluated: self.outcomes.len(),
            candidates: self.search.grid().len(),
            valid: self.valid,
            best_score: self.best_score,
        }
    }

    pub(crate) fn result(&self) -> Result<SearchResult, String> {
        if !self.done() {
            return Err("Shooting search has not finished yet.".to_string());
        }
        select_best(self.search.steady_state(), self.outcomes.clone())
            .map_err(|e| format!("Shooting search failed: {}", e))
    }
}

#[wasm_bindgen]
pub struct WasmShootingSearchRunner {
    state: Option<SearchRunnerState>,
}

#[wasm_bindgen]
impl WasmShootingSearchRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmShootingSearchRunner, JsValue> {
        console_error_panic_hook::set_once();
        let search = build_search(config).map_err(to_js_error)?;
        Ok(WasmShootingSearchRunner {
            state: Some(SearchRunnerState::new(search)),
        })
    }

    pub fn is_done(&self) -> bool {
        self.state.as_ref().map_or(true, |state| state.done())
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        serialize(&state.advance(batch_size as usize))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        serialize(&state.progress())
    }

    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        let result = state.result().map_err(|e| JsValue::from_str(&e))?;
        serialize(&SearchReport::from(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_core::grid::GridSettings;
    use credit_core::newton::NewtonSettings;
    use credit_core::ShootingConfig;

    fn small_config() -> ShootingConfig {
        ShootingConfig {
            grid: GridSettings {
                count: 40,
                ..GridSettings::default()
            },
            ..ShootingConfig::default()
        }
    }

    #[test]
    fn stepped_runner_matches_one_shot_search() {
        let search = ShootingSearch::new(small_config()).expect("search");
        let expected = search.run_sequential().expect("winner");

        let mut state = SearchRunnerState::new(search);
        assert!(state.result().is_err(), "result before completion");

        let first = state.advance(15);
        assert_eq!(first.evaluated, 15);
        assert!(!first.done);

        state.advance(15);
        let last = state.advance(15);
        assert_eq!(last.evaluated, 40);
        assert!(last.done);
        assert_eq!(last.valid, 40);
        assert_eq!(last.best_score, Some(expected.score));

        assert_eq!(state.result().expect("winner"), expected);
    }

    #[test]
    fn stepped_runner_reports_exhaustion() {
        let config = ShootingConfig {
            newton: NewtonSettings {
                max_steps: 1,
                ..NewtonSettings::default()
            },
            ..small_config()
        };
        let mut state = SearchRunnerState::new(ShootingSearch::new(config).expect("search"));
        let progress = state.advance(100);
        assert!(progress.done);
        assert_eq!(progress.valid, 0);
        assert_eq!(progress.best_score, None);

        let message = state.result().expect_err("no winner");
        assert!(message.contains("Shooting search failed"), "{message}");
    }

    #[test]
    fn progress_skips_non_finite_scores() {
        let search = ShootingSearch::new(small_config()).expect("search");
        let scored = |index: usize| {
            let outcome = search.evaluate(index).expect("candidate");
            outcome.result.expect("valid path")
        };
        let mut state = SearchRunnerState::new(search.clone());

        let mut nan = scored(0);
        nan.score = f64::NAN;
        state.record(CandidateOutcome {
            index: 0,
            guess: nan.trajectory.guess,
            result: Ok(nan),
        });
        let progress = state.progress();
        assert_eq!(progress.valid, 0);
        assert_eq!(progress.best_score, None);

        let finite = scored(1);
        let expected = finite.score;
        state.record(CandidateOutcome {
            index: 1,
            guess: finite.trajectory.guess,
            result: Ok(finite),
        });
        let progress = state.progress();
        assert_eq!(progress.valid, 1);
        assert_eq!(progress.best_score, Some(expected));
    }

    #[test]
    fn report_carries_the_winning_path() {
        let result = ShootingSearch::new(small_config())
            .expect("search")
            .run_sequential()
            .expect("winner");
        let report = SearchReport::from(&result);
        assert_eq!(report.index, result.index);
        assert_eq!(report.trajectory.guess, result.guess);
        assert_eq!(report.trajectory.score, result.score);
        assert_eq!(report.trajectory.time.len(), 101);
    }
}
