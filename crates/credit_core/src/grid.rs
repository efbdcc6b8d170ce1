//! Candidate period-1 prices for the shooting search.
//!
//! The candidates are evenly spaced over q*(m - δ)..=q*(m + δ). The paper
//! reports an initial price jump of about 0.37%, so the reference grid is
//! centred on m = 1.0037 with a half-width of δ = 0.0005.

use crate::error::ShootingError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Number of candidates N.
    pub count: usize,
    /// Expected relative jump m of the period-1 price.
    pub center: f64,
    /// Half-width δ, relative to q*.
    pub half_width: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            count: 1000,
            center: 1.0037,
            half_width: 0.0005,
        }
    }
}

impl GridSettings {
    pub fn validate(&self) -> Result<(), ShootingError> {
        if self.count < 2 {
            return Err(ShootingError::InvalidConfig(
                "Guess grid needs at least two candidates.".into(),
            ));
        }
        if !(self.center.is_finite() && self.center > 0.0) {
            return Err(ShootingError::InvalidConfig(format!(
                "Grid center must be positive and finite (got {}).",
                self.center
            )));
        }
        if !(self.half_width.is_finite() && self.half_width > 0.0 && self.half_width < self.center)
        {
            return Err(ShootingError::InvalidConfig(format!(
                "Grid half-width must lie in (0, center) (got {}).",
                self.half_width
            )));
        }
        Ok(())
    }
}

/// Only built through [`GuessGrid::linspace`], which guarantees at least two
/// strictly increasing points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuessGrid {
    values: Vec<f64>,
}

impl GuessGrid {
    /// Builds the grid around the steady-state price.
    pub fn around(steady_price: f64, settings: &GridSettings) -> Result<Self, ShootingError> {
        settings.validate()?;
        let lower = steady_price * (settings.center - settings.half_width);
        let upper = steady_price * (settings.center + settings.half_width);
        Self::linspace(lower, upper, settings.count)
    }

    /// `count` evenly spaced points with both endpoints included.
    pub fn linspace(lower: f64, upper: f64, count: usize) -> Result<Self, ShootingError> {
        if !(lower.is_finite() && upper.is_finite() && upper > lower) {
            return Err(ShootingError::InvalidConfig(format!(
                "Invalid guess interval [{lower}, {upper}]."
            )));
        }
        if count < 2 {
            return Err(ShootingError::InvalidConfig(
                "Guess grid needs at least two candidates.".into(),
            ));
        }

        let step = (upper - lower) / (count as f64 - 1.0);
        let mut values: Vec<f64> = (0..count).map(|i| lower + step * i as f64).collect();
        values[count - 1] = upper;

        if values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ShootingError::InvalidConfig(format!(
                "Guess grid of {count} points over [{lower}, {upper}] is not strictly increasing."
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn lower(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn upper(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_grid_spans_configured_interval() {
        let q_star = 55.169_130_543_723;
        let grid = GuessGrid::around(q_star, &GridSettings::default()).expect("grid");
        assert_eq!(grid.len(), 1000);
        assert_eq!(grid.lower(), Some(q_star * (1.0037 - 0.0005)));
        assert_eq!(grid.upper(), Some(q_star * (1.0037 + 0.0005)));
        assert!(grid.values().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn empty_grid_has_no_bounds() {
        let grid = GuessGrid { values: Vec::new() };
        assert!(grid.is_empty());
        assert_eq!(grid.lower(), None);
        assert_eq!(grid.upper(), None);
        assert_eq!(grid.get(0), None);
    }

    #[test]
    fn linspace_is_evenly_spaced() {
        let grid = GuessGrid::linspace(1.0, 2.0, 5).expect("grid");
        assert_eq!(grid.values(), &[1.0, 1.25, 1.5, 1.75, 2.0]);
    }

    #[test]
    fn rejects_degenerate_settings() {
        let too_few = GridSettings {
            count: 1,
            ..GridSettings::default()
        };
        assert!(GuessGrid::around(50.0, &too_few).is_err());

        let zero_width = GridSettings {
            half_width: 0.0,
            ..GridSettings::default()
        };
        assert!(GuessGrid::around(50.0, &zero_width).is_err());

        assert!(GuessGrid::linspace(2.0, 1.0, 10).is_err());
    }

    #[test]
    fn rejects_grids_finer_than_float_resolution() {
        let err = GuessGrid::linspace(1.0, 1.0 + 4.0 * f64::EPSILON, 100).expect_err("too fine");
        assert!(matches!(err, ShootingError::InvalidConfig(msg) if msg.contains("strictly increasing")));
    }
}
