//! The `credit_core` crate reproduces the transition path of the Kiyotaki-Moore
//! credit-cycle model after a productivity shock, using a shooting algorithm.
//!
//! Key components:
//! - **Traits**: `Scalar` (f64 or dual numbers), `ResidualSystem` (square nonlinear systems).
//! - **Newton**: damped Newton iteration with dual-number Jacobians and an LU solve.
//! - **Steady state**: closed-form (q*, K*, B*) and the downpayment offset ν.
//! - **Step**: the joint one-period solve for (q_{t+1}, K_t, B_t).
//! - **Trajectory**: forward simulation from a period-1 price guess.
//! - **Search**: grid of guesses, convergence scoring and deterministic selection.

pub mod autodiff;
pub mod config;
pub mod error;
pub mod grid;
pub mod newton;
pub mod params;
pub mod search;
pub mod shock;
pub mod steady_state;
pub mod step;
pub mod traits;
pub mod trajectory;

pub use config::ShootingConfig;
pub use error::{InvalidTrajectory, ShootingError, StepError};
pub use search::{SearchResult, ShootingSearch};
pub use steady_state::SteadyState;
pub use trajectory::Trajectory;
