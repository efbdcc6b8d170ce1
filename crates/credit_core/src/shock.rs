use crate::error::ShootingError;
use crate::params::StructuralParameters;
use serde::{Deserialize, Serialize};

/// Additive productivity deviation Δ_t for each period 0..=T.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockSchedule {
    deviations: Vec<f64>,
}

impl ShockSchedule {
    /// No shock in any period.
    pub fn none(horizon: usize) -> Self {
        Self {
            deviations: vec![0.0; horizon + 1],
        }
    }

    /// A single, non-repeating shock of `size` in `period`.
    pub fn impulse(horizon: usize, period: usize, size: f64) -> Result<Self, ShootingError> {
        if period == 0 || period > horizon {
            return Err(ShootingError::InvalidConfig(format!(
                "Shock period must lie in 1..={horizon} (got {period})."
            )));
        }
        let mut schedule = Self::none(horizon);
        schedule.deviations[period] = size;
        Ok(schedule)
    }

    pub fn from_deviations(horizon: usize, deviations: Vec<f64>) -> Result<Self, ShootingError> {
        if deviations.len() != horizon + 1 {
            return Err(ShootingError::InvalidConfig(format!(
                "Shock schedule needs {} entries (periods 0..={horizon}), got {}.",
                horizon + 1,
                deviations.len()
            )));
        }
        if deviations.iter().any(|d| !d.is_finite()) {
            return Err(ShootingError::InvalidConfig(
                "Shock schedule entries must be finite.".into(),
            ));
        }
        Ok(Self { deviations })
    }

    /// Deviation in period `t`; zero beyond the schedule.
    pub fn at(&self, t: usize) -> f64 {
        self.deviations.get(t).copied().unwrap_or(0.0)
    }

    pub fn horizon(&self) -> usize {
        self.deviations.len().saturating_sub(1)
    }

    pub fn is_quiet(&self) -> bool {
        self.deviations.iter().all(|d| *d == 0.0)
    }

    pub fn deviations(&self) -> &[f64] {
        &self.deviations
    }
}

/// Configuration-side description of the shock path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShockSpec {
    /// One-time shock of size Δa in `period`.
    Impulse { period: usize },
    None,
    /// Explicit Δ_t for every period 0..=T.
    Schedule { deviations: Vec<f64> },
}

impl Default for ShockSpec {
    fn default() -> Self {
        ShockSpec::Impulse { period: 1 }
    }
}

impl ShockSpec {
    pub fn build(
        &self,
        horizon: usize,
        params: &StructuralParameters,
    ) -> Result<ShockSchedule, ShootingError> {
        match self {
            ShockSpec::Impulse { period } => {
                ShockSchedule::impulse(horizon, *period, params.productivity_shock)
            }
            ShockSpec::None => Ok(ShockSchedule::none(horizon)),
            ShockSpec::Schedule { deviations } => {
                ShockSchedule::from_deviations(horizon, deviations.clone())
            }
        }
    }
}
