use crate::error::StepError;
use num_traits::{NumOps, One, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// A trait for types that residual functions can be evaluated over.
/// Implemented for `f64` (values) and `Dual` (values plus one directional derivative).
pub trait Scalar: Copy + Debug + NumOps + Neg<Output = Self> + Zero + One + 'static {
    /// Embeds a constant (zero derivative part).
    fn lift(value: f64) -> Self;

    /// The real part of the scalar.
    fn real(self) -> f64;
}

impl Scalar for f64 {
    fn lift(value: f64) -> Self {
        value
    }

    fn real(self) -> f64 {
        self
    }
}

/// A square system of nonlinear equations F(x) = 0.
pub trait ResidualSystem<T: Scalar> {
    /// Number of unknowns (and equations).
    fn dimension(&self) -> usize;

    /// Evaluates F(x) into `out`.
    fn residual(&self, x: &[T], out: &mut [T]);

    /// Rejects iterates at which the residual is undefined.
    fn check_domain(&self, _x: &[f64]) -> Result<(), StepError> {
        Ok(())
    }
}
