use crate::error::ShootingError;
use crate::grid::GridSettings;
use crate::newton::NewtonSettings;
use crate::params::StructuralParameters;
use crate::shock::ShockSpec;
use serde::{Deserialize, Serialize};

/// Everything a shooting run needs. Missing fields take the reference values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingConfig {
    pub parameters: StructuralParameters,
    /// Number of periods T after the steady-state period 0.
    pub horizon: usize,
    pub grid: GridSettings,
    pub newton: NewtonSettings,
    pub shock: ShockSpec,
}

impl Default for ShootingConfig {
    fn default() -> Self {
        Self {
            parameters: StructuralParameters::default(),
            horizon: 100,
            grid: GridSettings::default(),
            newton: NewtonSettings::default(),
            shock: ShockSpec::default(),
        }
    }
}

impl ShootingConfig {
    /// Checks the run settings. Structural parameters are checked by the
    /// steady-state computation, which reports them as domain errors.
    pub fn validate(&self) -> Result<(), ShootingError> {
        if self.horizon < 2 {
            return Err(ShootingError::InvalidConfig(format!(
                "horizon must be at least 2 periods (got {}).",
                self.horizon
            )));
        }
        self.grid.validate()?;
        self.newton.validate()?;
        self.shock.build(self.horizon, &self.parameters).map(|_| ())
    }
}
