use crate::error::ShootingError;
use serde::{Deserialize, Serialize};

/// Structural constants of the land/credit economy, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralParameters {
    /// Gross interest factor R.
    pub interest_factor: f64,
    /// Fraction λ of trees surviving one period.
    pub survival_rate: f64,
    /// Elasticity η of the residual land supply at the steady state.
    pub elasticity: f64,
    /// Baseline productivity a.
    pub productivity: f64,
    /// Size Δa of the productivity shock.
    pub productivity_shock: f64,
    /// Probability π that a planting opportunity arrives.
    pub reallocation_probability: f64,
    /// Trees ϕ created per unit of fruit.
    pub trees_per_fruit: f64,
}

impl Default for StructuralParameters {
    /// Calibration of Kiyotaki & Moore (1997), p. 237.
    fn default() -> Self {
        Self {
            interest_factor: 1.01,
            survival_rate: 0.975,
            elasticity: 0.10,
            productivity: 1.0,
            productivity_shock: 0.01,
            reallocation_probability: 0.1,
            trees_per_fruit: 20.0,
        }
    }
}

impl StructuralParameters {
    pub fn validate(&self) -> Result<(), ShootingError> {
        let named = [
            ("interest_factor", self.interest_factor),
            ("survival_rate", self.survival_rate),
            ("elasticity", self.elasticity),
            ("productivity", self.productivity),
            ("productivity_shock", self.productivity_shock),
            ("reallocation_probability", self.reallocation_probability),
            ("trees_per_fruit", self.trees_per_fruit),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ShootingError::Domain(format!(
                "{name} must be finite (got {value})."
            )));
        }

        if self.interest_factor <= 1.0 {
            return Err(ShootingError::Domain(format!(
                "interest factor R must exceed 1 (got {}).",
                self.interest_factor
            )));
        }
        for (name, value) in [
            ("survival rate λ", self.survival_rate),
            ("elasticity η", self.elasticity),
            ("reallocation probability π", self.reallocation_probability),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ShootingError::Domain(format!(
                    "{name} must lie in (0, 1) (got {value})."
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_calibration_is_valid() {
        assert!(StructuralParameters::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let unit_interest = StructuralParameters {
            interest_factor: 1.0,
            ..StructuralParameters::default()
        };
        assert!(matches!(
            unit_interest.validate(),
            Err(ShootingError::Domain(msg)) if msg.contains("interest factor")
        ));

        let zero_elasticity = StructuralParameters {
            elasticity: 0.0,
            ..StructuralParameters::default()
        };
        assert!(matches!(
            zero_elasticity.validate(),
            Err(ShootingError::Domain(msg)) if msg.contains("elasticity")
        ));

        let nan_phi = StructuralParameters {
            trees_per_fruit: f64::NAN,
            ..StructuralParameters::default()
        };
        assert!(matches!(
            nan_phi.validate(),
            Err(ShootingError::Domain(msg)) if msg.contains("trees_per_fruit")
        ));
    }
}
