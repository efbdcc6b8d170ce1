//! Closed-form fixed point (q*, K*, B*) of the three-equation system.

use crate::error::ShootingError;
use crate::params::StructuralParameters;
use serde::{Deserialize, Serialize};

/// Relative size below which the steady-state denominator counts as zero.
const DENOMINATOR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    /// Land price q*.
    pub price: f64,
    /// Farmers' landholding K*.
    pub landholding: f64,
    /// Farmers' debt B*.
    pub debt: f64,
    /// Offset ν of the downpayment function u(K) = K - ν.
    pub downpayment_offset: f64,
}

impl SteadyState {
    pub fn compute(params: &StructuralParameters) -> Result<Self, ShootingError> {
        params.validate()?;

        let r = params.interest_factor;
        let lambda = params.survival_rate;
        let pi = params.reallocation_probability;
        let a = params.productivity;
        let phi = params.trees_per_fruit;

        let planting = (1.0 - lambda) * (1.0 - r + pi * r);
        let denominator = lambda * pi + planting;
        let scale = (lambda * pi).abs() + planting.abs();
        if denominator.abs() <= DENOMINATOR_EPSILON * scale {
            return Err(ShootingError::Domain(format!(
                "λπ + (1-λ)(1-R+πR) vanishes (= {denominator:e})."
            )));
        }

        let price = (r / (r - 1.0)) * (pi * a - planting * phi) / denominator;
        let downpayment_offset = ((r - 1.0) / r) * (price / params.elasticity);
        let landholding = ((r - 1.0) / r) * price + downpayment_offset;
        let debt = (a - phi + lambda * phi) * landholding / (r - 1.0);

        if !(price.is_finite() && price > 0.0) {
            return Err(ShootingError::Domain(format!(
                "land price q* must be positive (got {price})."
            )));
        }
        if !(landholding > downpayment_offset) {
            return Err(ShootingError::Domain(format!(
                "landholding K* = {landholding} does not exceed ν = {downpayment_offset}."
            )));
        }
        if !debt.is_finite() {
            return Err(ShootingError::Domain(format!("debt B* is not finite ({debt}).")));
        }

        Ok(Self {
            price,
            landholding,
            debt,
            downpayment_offset,
        })
    }

    /// u(K) = K - ν.
    pub fn downpayment(&self, landholding: f64) -> f64 {
        landholding - self.downpayment_offset
    }

    /// (q*, K*, B*) in solver order.
    pub fn triple(&self) -> [f64; 3] {
        [self.price, self.landholding, self.debt]
    }
}
