use std::fmt::Display;

use ndarray::{Array1, Array2};

use crate::bounds::Bounds;
use crate::error::{OptimError, Result};

/// A scalar function to minimise. Lower is better.
///
/// Implemented for every `Fn(&Array1<f64>) -> f64`; wrap closures that can
/// fail in [`Fallible`].
pub trait Objective {
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64>;
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64,
{
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64> {
        Ok(self(x))
    }
}

/// Adapter for objectives returning `Result<f64, E>`; an `Err` aborts the run
/// and is reported as [`OptimError::Objective`].
pub struct Fallible<F>(pub F);

impl<F, E> Objective for Fallible<F>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, E>,
    E: Display,
{
    fn evaluate(&self, x: &Array1<f64>) -> Result<f64> {
        (self.0)(x).map_err(|e| OptimError::Objective(e.to_string()))
    }
}

/// Counting front-end to the objective used for one run
pub struct Evaluator<'a, F: ?Sized> {
    objective: &'a F,
    bounds: &'a Bounds,
    nfe: usize,
}

impl<'a, F: Objective + ?Sized> Evaluator<'a, F> {
    pub fn new(objective: &'a F, bounds: &'a Bounds) -> Self {
        Self { objective, bounds, nfe: 0 }
    }

    pub fn bounds(&self) -> &Bounds {
        self.bounds
    }

    /// Number of objective calls so far
    pub fn nfe(&self) -> usize {
        self.nfe
    }

    pub fn evaluate(&mut self, x: &Array1<f64>) -> Result<f64> {
        if x.len() != self.bounds.dim() {
            return Err(OptimError::DimensionMismatch { expected: self.bounds.dim(), got: x.len() });
        }
        debug_assert!(self.bounds.contains(x), "candidate outside bounds: {:?}", x);
        self.nfe += 1;
        let f = self.objective.evaluate(x)?;
        if f.is_nan() {
            return Err(OptimError::NotANumber { x: x.to_vec() });
        }
        Ok(f)
    }

    /// Evaluate every row of `pop`
    pub fn evaluate_rows(&mut self, pop: &Array2<f64>) -> Result<Array1<f64>> {
        let mut scores = Array1::<f64>::zeros(pop.nrows());
        for (i, row) in pop.rows().into_iter().enumerate() {
            scores[i] = self.evaluate(&row.to_owned())?;
        }
        Ok(scores)
    }
}
