//! Core WASM model wrapper and low-level utilities.

use crate::report::TrajectoryReport;
use anyhow::{anyhow, Context};
use credit_core::step::PeriodInputs;
use credit_core::{ShootingConfig, ShootingSearch};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Reads a configuration object; `undefined`/`null` selects the reference run.
pub(crate) fn parse_config(config: JsValue) -> anyhow::Result<ShootingConfig> {
    if config.is_undefined() || config.is_null() {
        return Ok(ShootingConfig::default());
    }
    from_value(config).map_err(|e| anyhow!("Invalid configuration object: {e}"))
}

pub(crate) fn build_search(config: JsValue) -> anyhow::Result<ShootingSearch> {
    let config = parse_config(config)?;
    ShootingSearch::new(config).context("Failed to set up shooting search")
}

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

pub(crate) fn serialize<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub struct WasmCreditModel {
    pub(crate) search: ShootingSearch,
}

#[wasm_bindgen]
impl WasmCreditModel {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmCreditModel, JsValue> {
        console_error_panic_hook::set_once();
        let search = build_search(config).map_err(to_js_error)?;
        Ok(WasmCreditModel { search })
    }

    pub fn steady_state(&self) -> Result<JsValue, JsValue> {
        serialize(self.search.steady_state())
    }

    pub fn horizon(&self) -> u32 {
        self.search.simulator().horizon() as u32
    }

    /// Candidate period-1 prices of the configured grid.
    pub fn guess_grid(&self) -> Vec<f64> {
        self.search.grid().values().to_vec()
    }

    /// Simulates a single period-1 price guess.
    pub fn simulate(&self, guess: f64) -> Result<JsValue, JsValue> {
        let trajectory = self
            .search
            .simulator()
            .simulate(guess)
            .map_err(|e| JsValue::from_str(&format!("Simulation failed: {}", e)))?;
        serialize(&TrajectoryReport::new(&trajectory, self.search.steady_state()))
    }

    /// Residuals of the three period equations at (q_{t+1}, K_t, B_t).
    #[allow(clippy::too_many_arguments)]
    pub fn step_residuals(
        &self,
        prev_landholding: f64,
        prev_debt: f64,
        price: f64,
        shock: f64,
        next_price: f64,
        landholding: f64,
        debt: f64,
    ) -> Vec<f64> {
        let inputs = PeriodInputs {
            prev_landholding,
            prev_debt,
            price,
            shock,
        };
        self.search
            .simulator()
            .step_solver()
            .residuals(inputs, [next_price, landholding, debt])
            .to_vec()
    }
}
