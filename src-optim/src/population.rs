use std::str::FromStr;

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::bounds::Bounds;

/// Candidate vectors (one per row) and their scores
#[derive(Debug, Clone)]
pub struct Population {
    pub solutions: Array2<f64>,
    pub scores: Array1<f64>,
}

impl Population {
    pub fn new(solutions: Array2<f64>, scores: Array1<f64>) -> Self {
        debug_assert_eq!(solutions.nrows(), scores.len());
        Self { solutions, scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Index and score of the best member
    pub fn best(&self) -> (usize, f64) {
        crate::argmin(&self.scores)
    }
}

/// Initialization scheme for the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Init {
    LatinHypercube,
    #[default]
    Random,
}

impl FromStr for Init {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lhs" | "latin_hypercube" | "latinhypercube" => Ok(Init::LatinHypercube),
            "random" | "uniform" => Ok(Init::Random),
            _ => Err(format!("unknown init scheme: {}", s)),
        }
    }
}

impl Init {
    /// Draw `npop` points strictly inside `bounds`; when `x0` is given it
    /// replaces the first member.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        npop: usize,
        bounds: &Bounds,
        x0: Option<&Array1<f64>>,
        rng: &mut R,
    ) -> Array2<f64> {
        let mut pop = match self {
            Init::LatinHypercube => init_latin_hypercube(npop, bounds, rng),
            Init::Random => init_random(npop, bounds, rng),
        };
        if let (Some(x0), true) = (x0, npop > 0) {
            pop.row_mut(0).assign(x0);
        }
        pop
    }
}

pub(crate) fn init_random<R: Rng + ?Sized>(npop: usize, bounds: &Bounds, rng: &mut R) -> Array2<f64> {
    let n = bounds.dim();
    let mut pop = Array2::<f64>::zeros((npop, n));
    for i in 0..npop {
        for j in 0..n {
            pop[(i, j)] = bounds.sample_coord(j, rng);
        }
    }
    pop
}

pub(crate) fn init_latin_hypercube<R: Rng + ?Sized>(
    npop: usize,
    bounds: &Bounds,
    rng: &mut R,
) -> Array2<f64> {
    let n = bounds.dim();
    let (lower, upper) = (bounds.lower(), bounds.upper());
    let mut samples = Array2::<f64>::zeros((npop, n));
    // For each dimension, create stratified samples and permute
    for j in 0..n {
        let mut vals = Vec::with_capacity(npop);
        for k in 0..npop {
            let u: f64 = rng.random::<f64>();
            vals.push(((k as f64) + u) / (npop as f64));
        }
        vals.shuffle(rng);
        for i in 0..npop {
            let v = lower[j] + vals[i] * (upper[j] - lower[j]);
            // a stratum edge can land on the bound itself
            samples[(i, j)] = if v > lower[j] && v < upper[j] { v } else { bounds.sample_coord(j, rng) };
        }
    }
    samples
}
